use std::path::Path;

use mlog_media::check_binary;
use mlog_storage::DriveClient;
use mlog_worker::WorkerConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env();
    config.validate()?;

    println!(
        "motionlog-selfcheck: starting with clips_dir={}",
        config.clips_dir.display()
    );
    ensure_clips_dir(&config.clips_dir).await?;
    ensure_binary(&config.still_program)?;
    ensure_binary(&config.video_program)?;
    ensure_drive_auth().await?;

    println!("motionlog-selfcheck: ok");
    Ok(())
}

async fn ensure_clips_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    let marker = path.join(".motionlog-selfcheck");
    tokio::fs::write(&marker, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("{} is not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&marker).await?;
    Ok(())
}

fn ensure_binary(program: &str) -> anyhow::Result<()> {
    let path = check_binary(program)?;
    println!("motionlog-selfcheck: found {} at {}", program, path.display());
    Ok(())
}

async fn ensure_drive_auth() -> anyhow::Result<()> {
    let drive = DriveClient::from_env().await?;
    drive.authenticate().await?;
    println!("motionlog-selfcheck: drive authentication ok");
    Ok(())
}
