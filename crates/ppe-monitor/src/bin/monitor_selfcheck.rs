use std::time::Duration;

use ppe_alerts::AlertChannel;
use ppe_monitor::{DirectoryFrameSource, MonitorConfig};
use ppe_perception::PerceptionClient;
use ppe_storage::S3Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;
    dotenvy::dotenv().ok();

    let config = MonitorConfig::from_env()?;
    println!(
        "monitor-selfcheck: starting for camera={} required={}",
        config.camera_name,
        ppe_models::join_labels(&config.required_categories)
    );

    ensure_env_present(&["S3_BUCKET_NAME", "REDIS_URL"])?;
    ensure_frame_source(&config)?;
    ensure_storage().await?;
    ensure_perception().await?;
    ensure_redis().await?;

    println!("monitor-selfcheck: ok");
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}

fn ensure_frame_source(config: &MonitorConfig) -> anyhow::Result<()> {
    match (&config.frame_dir, &config.snapshot_url) {
        (Some(dir), _) => {
            let source = DirectoryFrameSource::open(dir)?;
            println!("monitor-selfcheck: {} frame(s) in {}", source.len(), dir);
            Ok(())
        }
        (None, Some(url)) => {
            url::Url::parse(url)
                .map_err(|e| anyhow::anyhow!("invalid PPE_SNAPSHOT_URL {}: {}", url, e))?;
            Ok(())
        }
        (None, None) => Err(anyhow::anyhow!(
            "no frame source: set PPE_FRAME_DIR or PPE_SNAPSHOT_URL"
        )),
    }
}

async fn ensure_storage() -> anyhow::Result<()> {
    let storage = S3Client::from_env().await?;
    storage.check_connectivity().await?;
    println!("monitor-selfcheck: bucket {} reachable", storage.bucket());
    Ok(())
}

async fn ensure_perception() -> anyhow::Result<()> {
    let client = PerceptionClient::from_env()?;
    let healthy = tokio::time::timeout(Duration::from_secs(10), client.health_check())
        .await
        .map_err(|_| anyhow::anyhow!("perception health check timed out"))??;
    if !healthy {
        return Err(anyhow::anyhow!(
            "perception service at {} is not healthy",
            client.base_url()
        ));
    }
    Ok(())
}

async fn ensure_redis() -> anyhow::Result<()> {
    let channel = AlertChannel::from_env()?;
    channel.ping().await?;
    println!("monitor-selfcheck: alert channel {} reachable", channel.channel_name());
    Ok(())
}
