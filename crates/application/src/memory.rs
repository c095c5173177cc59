//! 内存实现的仓储（用于测试和 `memory` 存储后端）
//!
//! 数据按插入顺序保存在 `Vec` 中，插入顺序即消息的“标识顺序”。

use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    Message, MessageId, NewMessage, NewParticipant, Participant, ParticipantId, RepositoryError,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repository::{MessageRepository, ParticipantRepository};

#[derive(Default, Clone)]
pub struct MemoryParticipantRepository {
    data: Arc<RwLock<Vec<Participant>>>,
}

impl MemoryParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryParticipantRepository {
    async fn insert(&self, participant: NewParticipant) -> Result<ParticipantId, RepositoryError> {
        let mut guard = self.data.write().await;
        // 与 Postgres 的唯一约束保持一致
        if guard.iter().any(|p| p.name == participant.name) {
            return Err(RepositoryError::Conflict);
        }
        let id = ParticipantId::from(Uuid::new_v4());
        guard.push(participant.with_id(id));
        Ok(id)
    }

    async fn find_all(&self) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self.data.read().await.clone())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Participant>, RepositoryError> {
        let guard = self.data.read().await;
        Ok(guard.iter().find(|p| p.name == name).cloned())
    }

    async fn touch(&self, name: &str, last_status: i64) -> Result<u64, RepositoryError> {
        let mut guard = self.data.write().await;
        match guard.iter_mut().find(|p| p.name == name) {
            Some(participant) => {
                participant.touch(last_status);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_stale(&self, now_ms: i64, stale_after_ms: i64) -> Result<u64, RepositoryError> {
        let mut guard = self.data.write().await;
        let before = guard.len();
        guard.retain(|p| !p.is_stale(now_ms, stale_after_ms));
        Ok((before - guard.len()) as u64)
    }
}

#[derive(Default, Clone)]
pub struct MemoryMessageRepository {
    data: Arc<RwLock<Vec<Message>>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn insert(&self, message: NewMessage) -> Result<MessageId, RepositoryError> {
        let id = MessageId::from(Uuid::new_v4());
        self.data.write().await.push(message.with_id(id));
        Ok(id)
    }

    async fn find_visible(
        &self,
        user: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let guard = self.data.read().await;
        let visible = guard.iter().rev().filter(|m| m.is_visible_to(user)).cloned();
        Ok(match limit {
            Some(limit) => visible.take(limit as usize).collect(),
            None => visible.collect(),
        })
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let guard = self.data.read().await;
        Ok(guard.iter().find(|m| m.id == id).cloned())
    }

    async fn replace(&self, message: Message) -> Result<u64, RepositoryError> {
        let mut guard = self.data.write().await;
        match guard.iter_mut().find(|m| m.id == message.id) {
            Some(stored) => {
                *stored = message;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: MessageId) -> Result<u64, RepositoryError> {
        let mut guard = self.data.write().await;
        let before = guard.len();
        guard.retain(|m| m.id != id);
        Ok((before - guard.len()) as u64)
    }
}
