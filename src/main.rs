use anyhow::Result;
use project_report::config::FileConfigStore;
use project_report::pipeline::{self, PipelineOptions};
use std::path::PathBuf;
use tracing::info;

/// Exports land next to the executable in `../extract`, unless
/// `REPORT_EXTRACT_DIR` points elsewhere.
fn extract_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("REPORT_EXTRACT_DIR") {
        return PathBuf::from(dir);
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    exe_dir.join("..").join("extract")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("project_report=info".parse()?),
        )
        .init();

    info!("Starting project report job");

    let options = PipelineOptions::new(extract_dir());
    let mut config = FileConfigStore::open(FileConfigStore::default_path())?;

    pipeline::run(&options, &mut config).await?;

    info!("Report published successfully!");
    Ok(())
}
