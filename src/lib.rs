pub mod cli;
pub mod core;
pub mod providers;
pub mod server;
pub mod store;

use anyhow::Result;
use tracing::debug;

use crate::core::config::AppConfig;

/// Commands the application can execute after configuration is loaded.
#[derive(Debug, Clone, Copy)]
pub enum AppCommand {
    Serve,
    Fetch,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Serve => cli::serve::run(&config).await,
        AppCommand::Fetch => cli::fetch::run(&config).await,
    }
}
