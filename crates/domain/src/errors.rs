//! 领域模型错误定义
//!
//! 定义了系统中所有可能的错误类型，提供清晰的错误上下文。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 验证错误，只携带第一个失败的字段
    #[error("验证失败: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// 参与者名称已被占用
    #[error("参与者已存在: {name}")]
    ParticipantAlreadyExists { name: String },

    /// 参与者不存在
    #[error("参与者不存在: {name}")]
    ParticipantNotFound { name: String },

    /// 消息不存在
    #[error("消息不存在: {id}")]
    MessageNotFound { id: String },

    /// 编辑者不是消息作者
    #[error("{editor} 不是该消息的作者")]
    NotMessageOwner { editor: String },
}

impl DomainError {
    /// 创建验证错误
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn participant_already_exists(name: impl Into<String>) -> Self {
        Self::ParticipantAlreadyExists { name: name.into() }
    }

    pub fn participant_not_found(name: impl Into<String>) -> Self {
        Self::ParticipantNotFound { name: name.into() }
    }

    pub fn message_not_found(id: impl Into<String>) -> Self {
        Self::MessageNotFound { id: id.into() }
    }

    pub fn not_message_owner(editor: impl Into<String>) -> Self {
        Self::NotMessageOwner {
            editor: editor.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 存储层错误
///
/// 更新/删除未命中不是错误，由仓储返回受影响行数表达。
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 违反唯一约束
    #[error("record already exists")]
    Conflict,

    /// 存储操作超时
    #[error("store operation `{operation}` timed out after {after_ms}ms")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    /// 底层存储失败
    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
