//! 请求载荷的清洗与校验
//!
//! 先去除标记再校验；校验失败只报告第一个失败字段，
//! 对外使用固定的提示文案。

use domain::{strip_markup, DomainError, MessageKind, NewMessage, NewParticipant};
use validator::{Validate, ValidationError, ValidationErrors};

/// 参与者名称无效时的固定提示
pub const INVALID_PARTICIPANT_MESSAGE: &str = "invalid participant name";

/// 消息载荷无效时的固定提示
pub const INVALID_MESSAGE_MESSAGE: &str = "invalid message payload";

// (结构体字段名, 对外字段名)，按声明顺序决定报告哪个字段
const PARTICIPANT_FIELDS: &[(&str, &str)] = &[("name", "name")];
const MESSAGE_FIELDS: &[(&str, &str)] = &[
    ("from", "from"),
    ("to", "to"),
    ("text", "text"),
    ("kind", "type"),
];

#[derive(Debug, Clone, Validate)]
pub struct ParticipantInput {
    #[validate(length(min = 1))]
    pub name: String,
}

impl ParticipantInput {
    pub fn sanitized(name: &str) -> Self {
        Self {
            name: strip_markup(name),
        }
    }

    pub fn check(&self) -> Result<(), DomainError> {
        first_failure(self.validate(), PARTICIPANT_FIELDS, INVALID_PARTICIPANT_MESSAGE)
    }

    pub fn into_new(self, now_ms: i64) -> Result<NewParticipant, DomainError> {
        self.check()?;
        Ok(NewParticipant::new(self.name, now_ms))
    }
}

#[derive(Debug, Clone, Validate)]
pub struct MessageInput {
    #[validate(length(min = 1))]
    pub from: String,
    #[validate(length(min = 1))]
    pub to: String,
    #[validate(length(min = 1))]
    pub text: String,
    #[validate(custom(function = "validate_user_kind"))]
    pub kind: String,
}

impl MessageInput {
    /// `type` 不做清洗，只能精确匹配枚举值
    pub fn sanitized(from: &str, to: &str, text: &str, kind: &str) -> Self {
        Self {
            from: strip_markup(from),
            to: strip_markup(to),
            text: strip_markup(text),
            kind: kind.to_owned(),
        }
    }

    pub fn check(&self) -> Result<(), DomainError> {
        first_failure(self.validate(), MESSAGE_FIELDS, INVALID_MESSAGE_MESSAGE)
    }

    pub fn into_new(self, time: String) -> Result<NewMessage, DomainError> {
        self.check()?;
        let kind = MessageKind::parse_user_kind(&self.kind)
            .ok_or_else(|| DomainError::validation_error("type", INVALID_MESSAGE_MESSAGE))?;

        Ok(NewMessage {
            from: self.from,
            to: self.to,
            text: self.text,
            kind,
            time,
        })
    }
}

fn validate_user_kind(value: &str) -> Result<(), ValidationError> {
    match MessageKind::parse_user_kind(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("message_kind")),
    }
}

fn first_failure(
    result: Result<(), ValidationErrors>,
    fields: &[(&'static str, &'static str)],
    message: &str,
) -> Result<(), DomainError> {
    let Err(errors) = result else {
        return Ok(());
    };

    let failed = errors.field_errors();
    let field = fields
        .iter()
        .find(|(name, _)| failed.contains_key(*name))
        .map(|(_, wire)| *wire)
        .unwrap_or("payload");

    Err(DomainError::validation_error(field, message))
}

/// 历史消息条数上限，`None` 表示不限制。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryLimit(Option<u32>);

impl HistoryLimit {
    pub fn unlimited() -> Self {
        Self(None)
    }

    /// 按“可选符号 + 前导数字”解析，例如 `"5abc"` 为 5；
    /// 无法解析或不大于 0 时不限制。
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::unlimited();
        };

        let raw = raw.trim_start();
        let (negative, digits) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            _ => (false, raw),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());

        if negative || end == 0 {
            return Self::unlimited();
        }

        // 超出 u32 的值等同于不限制
        match digits[..end].parse::<u32>() {
            Ok(0) | Err(_) => Self::unlimited(),
            Ok(limit) => Self(Some(limit)),
        }
    }

    pub fn get(&self) -> Option<u32> {
        self.0
    }
}

impl From<u32> for HistoryLimit {
    fn from(value: u32) -> Self {
        if value == 0 {
            Self::unlimited()
        } else {
            Self(Some(value))
        }
    }
}
