//! Port freeing command.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use quire_proc::{PortReclaimer, Runner};

use crate::config::{self, ServeSettings};

/// Port from the command line, else from the config file.
///
/// A broken config file falls back to the default port.
pub fn resolve_port(port: Option<u16>, config_path: &Path) -> u16 {
    if let Some(port) = port {
        return port;
    }

    match config::load(config_path) {
        Ok(config) => config.serve.port,
        Err(e) => {
            let port = ServeSettings::default().port;
            tracing::warn!("{:#}, using port {}", e, port);
            port
        }
    }
}

/// Run the kill-port command. Never fails.
pub async fn run(runner: Arc<dyn Runner>, port: u16) -> Result<()> {
    let killed = tokio::task::spawn_blocking(move || {
        PortReclaimer::new(runner.as_ref()).reclaim_quietly(port)
    })
    .await
    .unwrap_or_default();

    if killed.is_empty() {
        tracing::info!("No process listening on port {}", port);
    } else {
        tracing::info!("Freed port {} ({} process(es) terminated)", port, killed.len());
    }

    Ok(())
}
