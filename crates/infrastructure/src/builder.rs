use std::{sync::Arc, time::Duration};

use application::{
    MemoryMessageRepository, MemoryParticipantRepository, MessageRepository,
    ParticipantRepository,
};
use config::{AppConfig, StorageBackend};
use sqlx::PgPool;
use thiserror::Error;

use crate::{
    migrations::MIGRATOR,
    repository::{create_pg_pool, PgMessageRepository, PgParticipantRepository},
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 按配置装配好的存储后端
#[derive(Clone)]
pub struct Infrastructure {
    pub participants: Arc<dyn ParticipantRepository>,
    pub messages: Arc<dyn MessageRepository>,
    /// 仅 postgres 后端存在
    pub pool: Option<PgPool>,
}

impl Infrastructure {
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        match config.storage.backend {
            StorageBackend::Postgres => {
                let pool = create_pg_pool(
                    &config.database.url,
                    config.database.max_connections,
                    Duration::from_millis(config.database.acquire_timeout_ms),
                )
                .await?;
                MIGRATOR.run(&pool).await?;
                tracing::info!(
                    database = %config.redacted_database_url(),
                    "PostgreSQL 存储已就绪"
                );
                Ok(Self::postgres(pool))
            }
            StorageBackend::Memory => {
                tracing::warn!("使用内存存储，进程退出后数据丢失");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            participants: Arc::new(PgParticipantRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            participants: Arc::new(MemoryParticipantRepository::new()),
            messages: Arc::new(MemoryMessageRepository::new()),
            pool: None,
        }
    }

    /// 关闭连接池
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
