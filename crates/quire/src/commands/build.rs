//! Site build command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use quire_proc::{GenerateResult, Generator, Runner};

use crate::config::Config;

/// Run the build command.
pub async fn run(config: &Config, runner: Arc<dyn Runner>) -> Result<()> {
    tracing::info!("Building site...");

    let result = generate(
        runner,
        config.build.command.clone(),
        config.site.output_dir.clone(),
    )
    .await?;

    tracing::info!("Built site in {}ms", result.duration_ms);
    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}

/// Run the site generator on a blocking thread.
///
/// A generator failure is returned as a bare `GeneratorError` so `main` can
/// propagate its exit code.
pub async fn generate(
    runner: Arc<dyn Runner>,
    command: Vec<String>,
    output_dir: PathBuf,
) -> Result<GenerateResult> {
    let result =
        tokio::task::spawn_blocking(move || Generator::new(runner.as_ref(), command, output_dir).run())
            .await
            .context("Site generator task failed")??;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_proc::{Cmd, ExecError, GeneratorError, Outcome};
    use std::sync::Mutex;

    struct FakeGenerator {
        code: i32,
        seen: Mutex<Vec<String>>,
    }

    impl Runner for FakeGenerator {
        fn run(&self, cmd: &Cmd) -> Result<Outcome, ExecError> {
            self.seen.lock().unwrap().push(cmd.to_string());
            Ok(Outcome::exited(self.code))
        }

        fn is_available(&self, _program: &str) -> bool {
            true
        }
    }

    fn runner(code: i32) -> Arc<FakeGenerator> {
        Arc::new(FakeGenerator {
            code,
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn runs_configured_generator() {
        let generator = runner(0);
        let mut config = Config::default();
        config.build.command = vec!["./generate".to_string(), "--release".to_string()];

        run(&config, generator.clone()).await.unwrap();

        assert_eq!(*generator.seen.lock().unwrap(), vec!["./generate --release"]);
    }

    #[tokio::test]
    async fn failure_keeps_generator_error_for_exit_code() {
        let err = run(&Config::default(), runner(2)).await.unwrap_err();

        let generator_error = err.downcast_ref::<GeneratorError>().unwrap();
        assert_eq!(generator_error.exit_code(), 2);
    }
}
