//! Build-then-serve command.

use std::sync::Arc;

use anyhow::Result;
use quire_proc::Runner;

use crate::commands::{build, serve};
use crate::config::Config;

/// Run the preview command.
pub async fn run(
    config: &Config,
    runner: Arc<dyn Runner>,
    port: Option<u16>,
    open: bool,
) -> Result<()> {
    build::run(config, Arc::clone(&runner)).await?;
    serve::run(config, runner, port, None, open).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_proc::{Cmd, ExecError, GeneratorError, Outcome};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Generator that fails; records everything run so port lookups show up.
    #[derive(Default)]
    struct FailingGenerator {
        seen: Mutex<Vec<String>>,
    }

    impl Runner for FailingGenerator {
        fn run(&self, cmd: &Cmd) -> Result<Outcome, ExecError> {
            self.seen.lock().unwrap().push(cmd.to_string());
            Ok(Outcome::exited(3))
        }

        fn is_available(&self, _program: &str) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn failed_build_exits_before_serving() {
        let temp = tempdir().unwrap();
        let mut config = Config::default();
        config.build.command = vec!["./generate".to_string()];
        config.site.output_dir = temp.path().to_path_buf();
        let runner = Arc::new(FailingGenerator::default());

        let err = run(&config, runner.clone(), Some(0), false)
            .await
            .unwrap_err();

        assert_eq!(err.downcast_ref::<GeneratorError>().unwrap().exit_code(), 3);
        assert_eq!(*runner.seen.lock().unwrap(), vec!["./generate"]);
    }
}
