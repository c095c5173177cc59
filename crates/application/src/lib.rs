//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入清洗与校验、存储调用超时、
//! 以及在线状态的周期清理。

pub mod clock;
pub mod error;
pub mod memory;
pub mod presence;
pub mod repository;
pub mod services;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ApplicationError;
pub use memory::{MemoryMessageRepository, MemoryParticipantRepository};
pub use presence::{PresenceSweeper, SweepSettings};
pub use repository::{MessageRepository, ParticipantRepository, StoreDeadline};
pub use services::{
    MessageService, MessageServiceDependencies, ParticipantService,
    ParticipantServiceDependencies,
};
pub use validation::HistoryLimit;
