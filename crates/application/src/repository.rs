use std::{future::Future, time::Duration};

use async_trait::async_trait;
use domain::{
    Message, MessageId, NewMessage, NewParticipant, Participant, ParticipantId, RepositoryError,
};

/// 参与者集合
///
/// 更新和删除未命中时返回 0，不视为错误。
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    async fn insert(&self, participant: NewParticipant) -> Result<ParticipantId, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Participant>, RepositoryError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Participant>, RepositoryError>;

    /// 刷新心跳时间，返回命中的行数
    async fn touch(&self, name: &str, last_status: i64) -> Result<u64, RepositoryError>;

    /// 删除 `now_ms - last_status > stale_after_ms` 的参与者，返回删除数量
    async fn delete_stale(&self, now_ms: i64, stale_after_ms: i64) -> Result<u64, RepositoryError>;
}

/// 消息集合
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: NewMessage) -> Result<MessageId, RepositoryError>;

    // 按插入顺序倒序（最新在前），limit 为 None 时不截断
    async fn find_visible(
        &self,
        user: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, RepositoryError>;

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;

    /// 整体替换消息字段，返回命中的行数
    async fn replace(&self, message: Message) -> Result<u64, RepositoryError>;

    async fn delete(&self, id: MessageId) -> Result<u64, RepositoryError>;
}

/// 存储调用的超时上限，挂起的存储调用不会无限阻塞请求。
#[derive(Debug, Clone, Copy)]
pub struct StoreDeadline {
    timeout: Duration,
}

impl StoreDeadline {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let after_ms = self.timeout.as_millis() as u64;
                tracing::warn!(operation, after_ms, "存储操作超时");
                Err(RepositoryError::Timeout {
                    operation,
                    after_ms,
                })
            }
        }
    }
}

impl Default for StoreDeadline {
    fn default() -> Self {
        Self::from_millis(5_000)
    }
}
