use anyhow::Result;

use focusflow::app::App;
use focusflow::config::{self, Config};
use focusflow::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    // Ensure config and logs directories exist
    config::ensure_directories()?;

    // Initialize file logging BEFORE any tracing calls
    let (log_file_info, _guard) = logging::init_file_logging(config::logs_dir())?;

    if let Ok(count) = logging::cleanup_old_logs(&config::logs_dir(), config.log_retention_days) {
        if count > 0 {
            tracing::info!("Cleaned up {} old log files", count);
        }
    }

    tracing::info!("Logging to: {}", log_file_info.path.display());

    // Write the defaults out once so there is a file to edit
    if !config::config_file_path().exists() {
        if let Err(e) = config.save() {
            tracing::warn!("Failed to write default config: {:#}", e);
        }
    }

    let mut app = App::new(config);
    app.run().await
}
