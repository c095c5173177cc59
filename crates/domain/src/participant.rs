use serde::{Deserialize, Serialize};

use crate::value_objects::ParticipantId;

/// 待写入的参与者，标识由存储层分配。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub name: String,
    pub last_status: i64,
}

impl NewParticipant {
    pub fn new(name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            name: name.into(),
            last_status: now_ms,
        }
    }

    pub fn with_id(self, id: ParticipantId) -> Participant {
        Participant {
            id,
            name: self.name,
            last_status: self.last_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "_id")]
    pub id: ParticipantId,
    pub name: String,
    /// 最近一次心跳（毫秒）
    #[serde(rename = "lastStatus")]
    pub last_status: i64,
}

impl Participant {
    /// 距离上次心跳超过阈值（严格大于）即视为离线。
    pub fn is_stale(&self, now_ms: i64, stale_after_ms: i64) -> bool {
        now_ms - self.last_status > stale_after_ms
    }

    pub fn touch(&mut self, now_ms: i64) {
        self.last_status = now_ms;
    }
}
