//! PPE compliance monitor binary.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ppe_alerts::AlertChannel;
use ppe_monitor::{
    metrics, DirectoryFrameSource, FrameSource, MonitorConfig, MonitorRunner, MonitorSession,
    RetentionTask, SessionDeps, SnapshotFrameSource, SystemClock,
};
use ppe_perception::PerceptionClient;
use ppe_storage::S3Client;

/// Interval between status summaries in the log.
const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(30);

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in ["ppe=info", "aws_config=warn", "aws_smithy_runtime=warn"] {
        if let Ok(d) = directive.parse() {
            env_filter = env_filter.add_directive(d);
        }
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn open_frame_source(config: &MonitorConfig) -> Result<Box<dyn FrameSource>, String> {
    if let Some(dir) = &config.frame_dir {
        let source = DirectoryFrameSource::open(dir).map_err(|e| e.to_string())?;
        return Ok(Box::new(source));
    }
    if let Some(url) = &config.snapshot_url {
        let source =
            SnapshotFrameSource::new(url, Duration::from_secs(5)).map_err(|e| e.to_string())?;
        return Ok(Box::new(source));
    }
    Err("set PPE_FRAME_DIR or PPE_SNAPSHOT_URL".to_string())
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting ppe-monitor");

    let config = match MonitorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Monitor config: {:?}", config);

    if let Some(addr) = &config.metrics_addr {
        match metrics::init_metrics(addr) {
            Ok(()) => info!("Prometheus metrics listening on {}", addr),
            Err(e) => warn!("Metrics disabled: {}", e),
        }
    }

    let storage = match S3Client::from_env().await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    let perception = match PerceptionClient::from_env() {
        Ok(p) => Arc::new(p),
        Err(e) => {
            error!("Failed to create perception client: {}", e);
            std::process::exit(1);
        }
    };

    let notifier = match AlertChannel::from_env() {
        Ok(n) => Arc::new(n),
        Err(e) => {
            error!("Failed to create alert channel: {}", e);
            std::process::exit(1);
        }
    };

    let source = match open_frame_source(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open frame source: {}", e);
            std::process::exit(1);
        }
    };

    let deps = SessionDeps {
        perception,
        storage: storage.clone(),
        notifier,
        clock: Arc::new(SystemClock),
    };

    let session = match MonitorSession::new(config.clone(), deps) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create monitor session: {}", e);
            std::process::exit(1);
        }
    };

    let mut status = session.subscribe_status();
    let runner = MonitorRunner::new(session, source);
    let shutdown = runner.shutdown_handle();

    // Setup signal handler
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_shutdown.trigger();
        }
    });

    let retention = config.frame_retention.map(|keep| {
        let task = RetentionTask::new(storage.clone(), keep, config.retention_interval);
        let rx = shutdown.subscribe();
        tokio::spawn(async move { task.run(rx).await })
    });

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(STATUS_LOG_INTERVAL);
        loop {
            ticker.tick().await;
            if status.has_changed().is_err() {
                break;
            }
            let snapshot = status.borrow_and_update().clone();
            info!(
                active_violation = snapshot.active_violation,
                no_person = snapshot.no_person,
                pending_evidence = snapshot.pending_evidence,
                frames = snapshot.frames_processed,
                "Status: {}",
                snapshot.status_lines().join(", ")
            );
        }
    });

    let result = runner.run().await;

    shutdown.trigger();
    if let Some(handle) = retention {
        handle.await.ok();
    }

    match result {
        Ok(summary) => {
            if let Some(e) = &summary.flush_error {
                warn!("Final alert flush failed: {}", e);
            }
            info!(
                "Monitor stopped ({:?}) after {} frame(s)",
                summary.reason, summary.frames
            );
        }
        Err(e) => {
            error!("Monitor error: {}", e);
            std::process::exit(1);
        }
    }
}
