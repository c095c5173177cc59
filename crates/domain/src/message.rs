use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value_objects::MessageId;

/// 广播接收者，表示“所有人”。
pub const BROADCAST_RECIPIENT: &str = "Todos";

/// 参与者注册时系统生成的入场通知正文。
pub const JOIN_NOTICE_TEXT: &str = "entra na sala...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Message,
    PrivateMessage,
    /// 仅用于系统生成的入场通知，客户端不可提交
    Status,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// 客户端可以提交的类型
    pub fn parse_user_kind(value: &str) -> Option<Self> {
        match value {
            "message" => Some(MessageKind::Message),
            "private_message" => Some(MessageKind::PrivateMessage),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(MessageKind::Status),
            other => Self::parse_user_kind(other)
                .ok_or_else(|| format!("unknown message type `{other}`")),
        }
    }
}

/// 待写入的消息，标识由存储层分配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
    pub time: String,
}

impl NewMessage {
    pub fn join_notice(name: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            from: name.into(),
            to: BROADCAST_RECIPIENT.to_owned(),
            text: JOIN_NOTICE_TEXT.to_owned(),
            kind: MessageKind::Status,
            time: time.into(),
        }
    }

    pub fn with_id(self, id: MessageId) -> Message {
        Message {
            id,
            from: self.from,
            to: self.to,
            text: self.text,
            kind: self.kind,
            time: self.time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: MessageId,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// `HH:mm:ss`，写入时按显示时区计算
    pub time: String,
}

impl Message {
    /// 发送者本人、点名接收者或广播消息对该用户可见。
    pub fn is_visible_to(&self, user: &str) -> bool {
        self.from == user || self.to == user || self.to == BROADCAST_RECIPIENT
    }

    pub fn is_authored_by(&self, name: &str) -> bool {
        self.from == name
    }

    /// 整体替换可编辑字段，标识保持不变。
    pub fn replace_with(&mut self, replacement: NewMessage) {
        self.from = replacement.from;
        self.to = replacement.to;
        self.text = replacement.text;
        self.kind = replacement.kind;
        self.time = replacement.time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn message(from: &str, to: &str) -> Message {
        NewMessage {
            from: from.into(),
            to: to.into(),
            text: "hi".into(),
            kind: MessageKind::PrivateMessage,
            time: "10:00:00".into(),
        }
        .with_id(MessageId(Uuid::new_v4()))
    }

    #[test]
    fn visibility_covers_sender_recipient_and_broadcast() {
        assert!(message("ana", "bia").is_visible_to("ana"));
        assert!(message("ana", "bia").is_visible_to("bia"));
        assert!(!message("ana", "bia").is_visible_to("caio"));
        assert!(message("ana", BROADCAST_RECIPIENT).is_visible_to("caio"));
    }

    #[test]
    fn status_kind_is_not_user_submittable() {
        assert_eq!(MessageKind::parse_user_kind("message"), Some(MessageKind::Message));
        assert_eq!(MessageKind::parse_user_kind("status"), None);
        assert_eq!("status".parse::<MessageKind>(), Ok(MessageKind::Status));
    }

    #[test]
    fn join_notice_is_broadcast_status() {
        let notice = NewMessage::join_notice("ana", "09:00:00");
        assert_eq!(notice.to, BROADCAST_RECIPIENT);
        assert_eq!(notice.kind, MessageKind::Status);
        assert_eq!(notice.text, JOIN_NOTICE_TEXT);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let json = serde_json::to_value(message("ana", "bia")).unwrap();
        assert_eq!(json["type"], "private_message");
        assert_eq!(json["from"], "ana");
        assert!(json["_id"].is_string());
    }

    #[test]
    fn replace_keeps_identity() {
        let mut original = message("ana", "bia");
        let id = original.id;
        original.replace_with(NewMessage {
            from: "ana".into(),
            to: BROADCAST_RECIPIENT.into(),
            text: "edited".into(),
            kind: MessageKind::Message,
            time: "11:00:00".into(),
        });
        assert_eq!(original.id, id);
        assert_eq!(original.text, "edited");
        assert_eq!(original.kind, MessageKind::Message);
    }
}
