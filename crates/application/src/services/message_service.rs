use std::sync::Arc;

use chrono::FixedOffset;
use domain::{display_time, DomainError, Message, MessageId};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{MessageRepository, StoreDeadline},
    validation::{HistoryLimit, MessageInput},
};

#[derive(Debug, Clone)]
pub struct PostMessageRequest {
    /// 来自调用方的 `user` 头
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct EditMessageRequest {
    pub message_id: String,
    /// 来自调用方的 `user` 头，必须与原消息作者一致
    pub editor: String,
    pub to: String,
    pub text: String,
    pub kind: String,
}

pub struct MessageServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
    pub deadline: StoreDeadline,
    pub display_offset: FixedOffset,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    fn current_time(&self) -> String {
        display_time(self.deps.clock.now(), self.deps.display_offset)
    }

    pub async fn post(&self, request: PostMessageRequest) -> Result<Message, ApplicationError> {
        let draft =
            MessageInput::sanitized(&request.from, &request.to, &request.text, &request.kind)
                .into_new(self.current_time())?;

        let id = self
            .deps
            .deadline
            .run(
                "messages.insert",
                self.deps.message_repository.insert(draft.clone()),
            )
            .await?;

        let message = draft.with_id(id);
        tracing::debug!(id = %message.id, from = %message.from, to = %message.to, "消息已保存");
        Ok(message)
    }

    /// 返回对该用户可见的最近 N 条消息，按时间正序。
    pub async fn history(
        &self,
        user: &str,
        limit: HistoryLimit,
    ) -> Result<Vec<Message>, ApplicationError> {
        let mut messages = self
            .deps
            .deadline
            .run(
                "messages.find_visible",
                self.deps.message_repository.find_visible(user, limit.get()),
            )
            .await?;

        // 存储按最新在前截断，交付前翻转为时间正序
        messages.reverse();
        Ok(messages)
    }

    pub async fn delete(&self, message_id: &str) -> Result<MessageId, ApplicationError> {
        let id = parse_message_id(message_id)?;

        let existing = self
            .deps
            .deadline
            .run(
                "messages.find_by_id",
                self.deps.message_repository.find_by_id(id),
            )
            .await?;
        if existing.is_none() {
            return Err(DomainError::message_not_found(message_id).into());
        }

        let deleted = self
            .deps
            .deadline
            .run("messages.delete", self.deps.message_repository.delete(id))
            .await?;
        if deleted == 0 {
            return Err(DomainError::message_not_found(message_id).into());
        }

        tracing::info!(id = %id, "消息已删除");
        Ok(id)
    }

    /// 校验载荷 -> 查找消息 -> 核对作者 -> 整体替换（含重新计算的时间）。
    pub async fn edit(&self, request: EditMessageRequest) -> Result<Message, ApplicationError> {
        let draft =
            MessageInput::sanitized(&request.editor, &request.to, &request.text, &request.kind)
                .into_new(self.current_time())?;

        let id = parse_message_id(&request.message_id)?;
        let mut message = self
            .deps
            .deadline
            .run(
                "messages.find_by_id",
                self.deps.message_repository.find_by_id(id),
            )
            .await?
            .ok_or_else(|| DomainError::message_not_found(&request.message_id))?;

        if !message.is_authored_by(&draft.from) {
            tracing::warn!(id = %id, editor = %draft.from, "非作者尝试编辑消息");
            return Err(DomainError::not_message_owner(draft.from).into());
        }

        message.replace_with(draft);
        let matched = self
            .deps
            .deadline
            .run(
                "messages.replace",
                self.deps.message_repository.replace(message.clone()),
            )
            .await?;
        if matched == 0 {
            return Err(DomainError::message_not_found(&request.message_id).into());
        }

        Ok(message)
    }
}

/// 非法格式的标识不可能存在，按“不存在”处理
fn parse_message_id(raw: &str) -> Result<MessageId, DomainError> {
    raw.parse::<MessageId>()
        .map_err(|_| DomainError::message_not_found(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, memory::MemoryMessageRepository, repository::MessageRepository};
    use domain::{MessageKind, BROADCAST_RECIPIENT};

    fn service() -> (MessageService, MemoryMessageRepository, Arc<ManualClock>) {
        let repository = MemoryMessageRepository::new();
        let clock = Arc::new(ManualClock::starting_at(1_705_320_000_000));
        let service = MessageService::new(MessageServiceDependencies {
            message_repository: Arc::new(repository.clone()),
            clock: clock.clone(),
            deadline: StoreDeadline::default(),
            display_offset: FixedOffset::west_opt(3 * 3600).unwrap(),
        });
        (service, repository, clock)
    }

    fn post(from: &str, to: &str, text: &str) -> PostMessageRequest {
        PostMessageRequest {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            kind: "message".into(),
        }
    }

    fn edit(id: MessageId, editor: &str, text: &str) -> EditMessageRequest {
        EditMessageRequest {
            message_id: id.to_string(),
            editor: editor.into(),
            to: BROADCAST_RECIPIENT.into(),
            text: text.into(),
            kind: "private_message".into(),
        }
    }

    #[tokio::test]
    async fn post_stamps_display_time() {
        let (service, _, _) = service();
        let message = service
            .post(post("ana", BROADCAST_RECIPIENT, "<b>oi</b>"))
            .await
            .unwrap();
        assert_eq!(message.text, "oi");
        assert_eq!(message.time, "09:00:00");
        assert_eq!(message.kind, MessageKind::Message);
    }

    #[tokio::test]
    async fn post_with_status_type_is_rejected() {
        let (service, repository, _) = service();
        let mut request = post("ana", BROADCAST_RECIPIENT, "oi");
        request.kind = "status".into();
        let err = service.post(request).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::ValidationError { .. })
        ));
        assert!(repository.find_visible("ana", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_returns_last_n_in_chronological_order() {
        let (service, _, _) = service();
        for text in ["A", "B", "C"] {
            service
                .post(post("ana", BROADCAST_RECIPIENT, text))
                .await
                .unwrap();
        }

        let texts: Vec<_> = service
            .history("bia", HistoryLimit::parse(Some("2")))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["B", "C"]);

        let all = service.history("bia", HistoryLimit::unlimited()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].text, "A");
    }

    #[tokio::test]
    async fn history_hides_other_peoples_private_messages() {
        let (service, _, _) = service();
        service.post(post("ana", "bia", "psst")).await.unwrap();
        service.post(post("caio", "ana", "hey")).await.unwrap();

        assert!(service
            .history("dani", HistoryLimit::unlimited())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            service
                .history("ana", HistoryLimit::unlimited())
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn delete_missing_message_is_not_found_every_time() {
        let (service, _, _) = service();
        let message = service.post(post("ana", "bia", "x")).await.unwrap();
        let id = message.id.to_string();

        assert_eq!(service.delete(&id).await.unwrap(), message.id);
        for _ in 0..2 {
            let err = service.delete(&id).await.unwrap_err();
            assert!(matches!(
                err,
                ApplicationError::Domain(DomainError::MessageNotFound { .. })
            ));
        }

        let err = service.delete("definitely-not-a-uuid").await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::MessageNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn edit_by_author_replaces_fields_and_time() {
        let (service, repository, clock) = service();
        let original = service.post(post("ana", "bia", "first")).await.unwrap();
        clock.advance(65_000);

        let edited = service.edit(edit(original.id, "ana", "second")).await.unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.text, "second");
        assert_eq!(edited.to, BROADCAST_RECIPIENT);
        assert_eq!(edited.kind, MessageKind::PrivateMessage);
        assert_eq!(edited.time, "09:01:05");

        let stored = repository.find_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(stored, edited);
    }

    #[tokio::test]
    async fn edit_by_someone_else_is_rejected_and_leaves_message_unchanged() {
        let (service, repository, _) = service();
        let original = service.post(post("ana", "bia", "first")).await.unwrap();

        let err = service.edit(edit(original.id, "bia", "hacked")).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::NotMessageOwner { .. })
        ));

        let stored = repository.find_by_id(original.id).await.unwrap().unwrap();
        assert_eq!(stored, original);
    }

    #[tokio::test]
    async fn edit_validates_before_lookup() {
        let (service, _, _) = service();
        let mut request = edit(MessageId::from(uuid::Uuid::new_v4()), "ana", "");
        let err = service.edit(request.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::ValidationError { .. })
        ));

        request.text = "ok".into();
        let err = service.edit(request).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::MessageNotFound { .. })
        ));
    }
}
