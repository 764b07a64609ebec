//! Clean command.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Config;

/// Run the clean command.
pub async fn run(config: &Config, all: bool) -> Result<()> {
    let output_dir = &config.site.output_dir;

    if is_protected(output_dir, &config.site.content_dir) {
        anyhow::bail!(
            "Refusing to remove output directory {}: it holds the content",
            output_dir.display()
        );
    }

    if output_dir.exists() {
        fs::remove_dir_all(output_dir)
            .with_context(|| format!("Failed to remove {}", output_dir.display()))?;
        tracing::info!("Removed {}", output_dir.display());
    } else {
        tracing::info!("{} does not exist, nothing to remove", output_dir.display());
    }

    if all {
        let removed = quire_logo::sweep_intermediates(&config.logo.assets_dir).with_context(|| {
            format!("Failed to clean {}", config.logo.assets_dir.display())
        })?;
        tracing::info!("Removed {} LaTeX intermediate files", removed.len());
    }

    Ok(())
}

/// Whether deleting `output` would take the content with it.
fn is_protected(output: &Path, content: &Path) -> bool {
    output.as_os_str().is_empty() || output == Path::new(".") || content.starts_with(output)
}
