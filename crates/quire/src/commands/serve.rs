//! Preview server command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use quire_proc::Runner;
use quire_server::{PreviewConfig, PreviewServer};

use crate::config::Config;

/// Merge CLI flags over the `[serve]` settings.
pub fn preview_config(
    config: &Config,
    port: Option<u16>,
    dir: Option<PathBuf>,
    open: bool,
) -> PreviewConfig {
    PreviewConfig {
        dir: dir.unwrap_or_else(|| config.site.output_dir.clone()),
        host: config.serve.host.clone(),
        port: port.unwrap_or(config.serve.port),
        open: open || config.serve.open,
    }
}

/// Run the serve command.
pub async fn run(
    config: &Config,
    runner: Arc<dyn Runner>,
    port: Option<u16>,
    dir: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let preview = preview_config(config, port, dir, open);

    PreviewServer::new(preview, runner).run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let config = Config::default();

        let preview = preview_config(&config, Some(9000), Some(PathBuf::from("public")), true);

        assert_eq!(preview.port, 9000);
        assert_eq!(preview.dir, PathBuf::from("public"));
        assert!(preview.open);
    }

    #[test]
    fn config_fills_missing_flags() {
        let mut config = Config::default();
        config.serve.port = 8123;
        config.site.output_dir = PathBuf::from("site");

        let preview = preview_config(&config, None, None, false);

        assert_eq!(preview.port, 8123);
        assert_eq!(preview.dir, PathBuf::from("site"));
        assert_eq!(preview.host, "127.0.0.1");
        assert!(!preview.open);
    }
}
