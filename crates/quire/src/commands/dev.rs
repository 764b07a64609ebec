//! Development loop: build, serve, rebuild on content changes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use quire_proc::Runner;
use quire_server::{shutdown_signal, ContentWatcher, PreviewServer, WatchEvent};
use tokio::sync::mpsc::Receiver;

use crate::commands::{build, serve};
use crate::config::Config;

/// Run the dev command.
pub async fn run(
    config: &Config,
    runner: Arc<dyn Runner>,
    port: Option<u16>,
    open: bool,
) -> Result<()> {
    build::run(config, Arc::clone(&runner)).await?;

    let server = PreviewServer::new(
        serve::preview_config(config, port, None, open),
        Arc::clone(&runner),
    )
    .bind()
    .await?;

    // The generator reads pages from the content dir and copies the assets dir.
    let watched = watched_dirs(config);
    let (watcher, rx) = ContentWatcher::new(&watched).context("Failed to start file watcher")?;
    for dir in &watched {
        tracing::info!("Watching {} for changes", dir.display());
    }

    let command = config.build.command.clone();
    let output_dir = config.site.output_dir.clone();

    let rebuilds = tokio::spawn(async move {
        let _watcher = watcher;
        rebuild_on_change(rx, runner, command, output_dir).await;
    });

    let served = server.serve_until(shutdown_signal()).await;
    rebuilds.abort();

    served?;
    Ok(())
}

fn watched_dirs(config: &Config) -> Vec<PathBuf> {
    let mut dirs = vec![config.site.content_dir.clone()];
    if !dirs.contains(&config.logo.assets_dir) {
        dirs.push(config.logo.assets_dir.clone());
    }
    dirs
}

/// Rebuild the site for each batch of changes until the channel closes.
///
/// Rebuilds run one at a time. Changes queued during a rebuild are folded
/// into the next one. A failed rebuild is logged and the loop continues.
pub async fn rebuild_on_change(
    mut rx: Receiver<WatchEvent>,
    runner: Arc<dyn Runner>,
    command: Vec<String>,
    output_dir: PathBuf,
) {
    while let Some(event) = rx.recv().await {
        let mut changed = 1;
        while rx.try_recv().is_ok() {
            changed += 1;
        }

        tracing::info!(
            "Changed: {} ({} file(s))",
            event.path().display(),
            changed
        );

        match build::generate(Arc::clone(&runner), command.clone(), output_dir.clone()).await {
            Ok(result) => tracing::info!("Rebuilt in {}ms", result.duration_ms),
            Err(e) => tracing::warn!("Rebuild failed: {:#}", e),
        }
    }
}
