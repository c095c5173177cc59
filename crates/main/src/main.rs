//! 主应用程序入口
//!
//! 装配存储、用例服务与在线状态清理任务，启动 Axum Web API 服务。

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use application::{
    services::{MessageServiceDependencies, ParticipantServiceDependencies},
    Clock, MessageService, ParticipantService, PresenceSweeper, StoreDeadline, SweepSettings,
    SystemClock,
};
use chrono::FixedOffset;
use config::AppConfig;
use infrastructure::Infrastructure;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志，未设置 RUST_LOG 时默认 info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("加载配置失败")?;
    tracing::info!(
        backend = ?config.storage.backend,
        database = %config.redacted_database_url(),
        "配置加载完成"
    );

    let infrastructure = Infrastructure::connect(&config)
        .await
        .context("初始化存储失败")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let deadline = StoreDeadline::from_millis(config.store.operation_timeout_ms);
    let display_offset = FixedOffset::east_opt(config.utc_offset_seconds())
        .context("显示时区偏移超出范围")?;

    let participant_service = Arc::new(ParticipantService::new(ParticipantServiceDependencies {
        participant_repository: infrastructure.participants.clone(),
        message_repository: infrastructure.messages.clone(),
        clock: clock.clone(),
        deadline,
        display_offset,
    }));

    let message_service = Arc::new(MessageService::new(MessageServiceDependencies {
        message_repository: infrastructure.messages.clone(),
        clock: clock.clone(),
        deadline,
        display_offset,
    }));

    // 启动在线状态清理任务
    let sweeper = Arc::new(PresenceSweeper::new(
        infrastructure.participants.clone(),
        clock,
        deadline,
        SweepSettings {
            interval: Duration::from_millis(config.presence.sweep_interval_ms),
            stale_after: Duration::from_millis(config.presence.stale_after_ms),
        },
    ));
    let shutdown = CancellationToken::new();
    let sweeper_handle = sweeper.spawn(shutdown.clone());

    // 启动 Web 服务器
    let app = router(AppState::new(participant_service, message_service));
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("无法监听 {address}"))?;

    tracing::info!("聊天服务启动在 http://{}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 停止清理任务并释放连接池
    shutdown.cancel();
    if let Err(err) = sweeper_handle.await {
        tracing::error!(error = %err, "在线状态清理任务异常退出");
    }
    infrastructure.close().await;

    tracing::info!("聊天服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "无法监听 Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "无法监听 SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("收到停止信号，开始优雅关闭");
}
