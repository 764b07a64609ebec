//! Logo asset command.

use std::sync::Arc;

use anyhow::{Context, Result};
use quire_logo::{LogoPipeline, SvgOutcome};
use quire_proc::Runner;

use crate::config::Config;

/// Run the logo command for the named job.
pub async fn run(config: &Config, runner: Arc<dyn Runner>, name: &str) -> Result<()> {
    let job = config.logo.job(name).with_context(|| {
        format!(
            "No logo job named '{}' (configured: {})",
            name,
            config.logo.job_names().join(", ")
        )
    })?;

    let assets_dir = config.logo.assets_dir.clone();
    let report = tokio::task::spawn_blocking(move || {
        LogoPipeline::new(runner.as_ref(), assets_dir).build(&job)
    })
    .await
    .context("Logo task failed")??;

    if let SvgOutcome::Converted { converter, .. } = report.svg {
        tracing::info!("{} built (SVG via {})", report.job, converter);
    } else {
        tracing::info!("{} built (PDF only)", report.job);
    }

    Ok(())
}
