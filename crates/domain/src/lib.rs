//! 聊天系统核心领域模型
//!
//! 包含参与者、消息两个实体，以及输入清洗（去除标记）等纯函数规则。

pub mod errors;
pub mod markup;
pub mod message;
pub mod participant;
pub mod value_objects;

// 重新导出常用类型
pub use errors::*;
pub use markup::strip_markup;
pub use message::{Message, MessageKind, NewMessage, BROADCAST_RECIPIENT, JOIN_NOTICE_TEXT};
pub use participant::{NewParticipant, Participant};
pub use value_objects::*;
