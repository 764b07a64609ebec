//! Initialize quire in a site repository.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing quire...");

    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    tracing::info!("Created {}", config_path.display());

    let root = config_path.parent().unwrap_or(Path::new(""));
    for dir in ["content", "assets"] {
        let path = root.join(dir);
        if !path.exists() {
            fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            tracing::info!("Created {}/", path.display());
        }
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'quire preview' to build and serve the site.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# quire configuration

[site]
# Sources read by the site generator
content_dir = "content"

# Directory the site generator writes
output_dir = "dist"

[build]
# Site generator command line
command = ["cargo", "run", "--release"]

[serve]
host = "127.0.0.1"
port = 8000
open = false

[logo]
# LaTeX sources and generated PDF/SVG live here
assets_dir = "assets"

[[logo.jobs]]
name = "logo"
source = "logo.tex"

[[logo.jobs]]
name = "ideep-logo"
source = "ideep-logo.tex"
"#;
