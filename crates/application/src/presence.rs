//! 在线状态清理
//!
//! 周期性删除心跳过期的参与者。单次清理失败只记录日志，
//! 下一个周期照常执行；被清理的参与者不会产生任何通知。

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{ParticipantRepository, StoreDeadline},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    /// 清理周期
    pub interval: Duration,
    /// 心跳过期阈值
    pub stale_after: Duration,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(15_000),
            stale_after: Duration::from_millis(10_000),
        }
    }
}

pub struct PresenceSweeper {
    participant_repository: Arc<dyn ParticipantRepository>,
    clock: Arc<dyn Clock>,
    deadline: StoreDeadline,
    settings: SweepSettings,
}

impl PresenceSweeper {
    pub fn new(
        participant_repository: Arc<dyn ParticipantRepository>,
        clock: Arc<dyn Clock>,
        deadline: StoreDeadline,
        settings: SweepSettings,
    ) -> Self {
        Self {
            participant_repository,
            clock,
            deadline,
            settings,
        }
    }

    /// 执行一次清理，返回删除的参与者数量
    pub async fn sweep_once(&self) -> Result<u64, ApplicationError> {
        let now_ms = self.clock.now_millis();
        let stale_after_ms = self.settings.stale_after.as_millis() as i64;

        let removed = self
            .deadline
            .run(
                "participants.delete_stale",
                self.participant_repository
                    .delete_stale(now_ms, stale_after_ms),
            )
            .await?;

        if removed > 0 {
            tracing::info!(removed, "清理离线参与者");
        } else {
            tracing::debug!("没有需要清理的参与者");
        }
        Ok(removed)
    }

    /// 启动后台清理任务，第一次清理在一个周期之后执行。
    ///
    /// 取消 `shutdown` 后任务在当前清理结束时退出。
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = self.settings.interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                interval_ms = period.as_millis() as u64,
                stale_after_ms = self.settings.stale_after.as_millis() as u64,
                "在线状态清理任务已启动"
            );

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(err) = self.sweep_once().await {
                            tracing::error!(error = %err, "在线状态清理失败");
                        }
                    }
                }
            }

            tracing::info!("在线状态清理任务已停止");
        })
    }
}
