use std::sync::Arc;

use chrono::FixedOffset;
use domain::{display_time, DomainError, NewMessage, Participant, RepositoryError};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{MessageRepository, ParticipantRepository, StoreDeadline},
    validation::ParticipantInput,
};

#[derive(Debug, Clone)]
pub struct RegisterParticipantRequest {
    pub name: String,
}

pub struct ParticipantServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
    pub deadline: StoreDeadline,
    pub display_offset: FixedOffset,
}

pub struct ParticipantService {
    deps: ParticipantServiceDependencies,
}

impl ParticipantService {
    pub fn new(deps: ParticipantServiceDependencies) -> Self {
        Self { deps }
    }

    /// 注册参与者并广播入场通知。
    ///
    /// 两次写入之间没有事务：通知写入失败时参与者仍然保留。
    pub async fn register(
        &self,
        request: RegisterParticipantRequest,
    ) -> Result<Participant, ApplicationError> {
        let now = self.deps.clock.now();
        let draft = ParticipantInput::sanitized(&request.name).into_new(now.timestamp_millis())?;

        let existing = self
            .deps
            .deadline
            .run(
                "participants.find_by_name",
                self.deps.participant_repository.find_by_name(&draft.name),
            )
            .await?;
        if existing.is_some() {
            return Err(DomainError::participant_already_exists(draft.name).into());
        }

        // 并发注册同名时由存储层唯一约束兜底
        let id = match self
            .deps
            .deadline
            .run(
                "participants.insert",
                self.deps.participant_repository.insert(draft.clone()),
            )
            .await
        {
            Ok(id) => id,
            Err(RepositoryError::Conflict) => {
                return Err(DomainError::participant_already_exists(draft.name).into())
            }
            Err(err) => return Err(err.into()),
        };
        let participant = draft.with_id(id);

        let notice = NewMessage::join_notice(
            participant.name.clone(),
            display_time(now, self.deps.display_offset),
        );
        self.deps
            .deadline
            .run(
                "messages.insert",
                self.deps.message_repository.insert(notice),
            )
            .await?;

        tracing::info!(participant = %participant.name, id = %participant.id, "参与者加入");
        Ok(participant)
    }

    pub async fn list(&self) -> Result<Vec<Participant>, ApplicationError> {
        let participants = self
            .deps
            .deadline
            .run(
                "participants.find_all",
                self.deps.participant_repository.find_all(),
            )
            .await?;
        Ok(participants)
    }

    /// 刷新心跳。名称按原样精确匹配。
    pub async fn heartbeat(&self, name: &str) -> Result<(), ApplicationError> {
        let existing = self
            .deps
            .deadline
            .run(
                "participants.find_by_name",
                self.deps.participant_repository.find_by_name(name),
            )
            .await?;
        if existing.is_none() {
            return Err(DomainError::participant_not_found(name).into());
        }

        let touched = self
            .deps
            .deadline
            .run(
                "participants.touch",
                self.deps
                    .participant_repository
                    .touch(name, self.deps.clock.now_millis()),
            )
            .await?;

        // 查询与更新之间被清理任务删除，更新落空但不报错
        if touched == 0 {
            tracing::debug!(participant = %name, "心跳更新未命中，参与者已被清理");
        }

        Ok(())
    }
}
