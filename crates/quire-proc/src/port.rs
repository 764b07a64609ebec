//! Freeing a TCP port before the preview server binds it.
//!
//! Owners are looked up with `lsof` and terminated with `kill -9`. A port with
//! no listener is not an error, and the calling process is never a target.

use crate::exec::{Cmd, ExecError, Runner};

const LSOF: &str = "lsof";

/// Errors that can occur while reclaiming a port.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("`lsof` not found on PATH, cannot look up the owner of port {0}")]
    LookupUnavailable(u16),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

/// Finds and terminates the processes listening on a port.
pub struct PortReclaimer<'a> {
    runner: &'a dyn Runner,
    own_pid: u32,
}

impl<'a> PortReclaimer<'a> {
    /// Create a reclaimer that never targets the current process.
    pub fn new(runner: &'a dyn Runner) -> Self {
        Self {
            runner,
            own_pid: std::process::id(),
        }
    }

    /// Override the pid treated as "ourselves".
    pub fn with_own_pid(mut self, pid: u32) -> Self {
        self.own_pid = pid;
        self
    }

    /// Pids of the processes listening on `port`, excluding our own.
    pub fn owners(&self, port: u16) -> Result<Vec<u32>, PortError> {
        if !self.runner.is_available(LSOF) {
            return Err(PortError::LookupUnavailable(port));
        }

        let cmd = Cmd::new(LSOF)
            .args(["-t", "-n", "-P"])
            .arg(format!("-iTCP:{port}"))
            .arg("-sTCP:LISTEN")
            .capture(true);

        // lsof exits 1 when nothing matches; only the pid list matters.
        let outcome = self.runner.run(&cmd)?;

        let mut pids: Vec<u32> = parse_pids(&outcome.stdout)
            .into_iter()
            .filter(|pid| *pid != self.own_pid)
            .collect();
        pids.sort_unstable();
        pids.dedup();

        Ok(pids)
    }

    /// Terminate every process listening on `port`.
    ///
    /// Returns the pids that were signalled successfully.
    pub fn reclaim(&self, port: u16) -> Result<Vec<u32>, PortError> {
        let owners = self.owners(port)?;

        if owners.is_empty() {
            tracing::debug!("Port {} is free", port);
            return Ok(owners);
        }

        let mut killed = Vec::with_capacity(owners.len());
        for pid in owners {
            let cmd = Cmd::new("kill")
                .args(["-9", &pid.to_string()])
                .capture(true);

            match self.runner.run(&cmd) {
                Ok(outcome) if outcome.success() => {
                    tracing::info!("Terminated process {} on port {}", pid, port);
                    killed.push(pid);
                }
                Ok(outcome) => {
                    tracing::warn!(
                        "Failed to terminate process {} on port {}: {}",
                        pid,
                        port,
                        outcome.stderr.trim()
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to terminate process {}: {}", pid, e);
                }
            }
        }

        Ok(killed)
    }

    /// Like [`reclaim`](Self::reclaim), but every failure is logged and swallowed.
    pub fn reclaim_quietly(&self, port: u16) -> Vec<u32> {
        match self.reclaim(port) {
            Ok(killed) => killed,
            Err(e) => {
                tracing::warn!("{}", e);
                Vec::new()
            }
        }
    }
}

/// Parse `lsof -t` output: one pid per line.
fn parse_pids(output: &str) -> Vec<u32> {
    output
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Outcome;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Simulates `lsof` reporting a fixed set of listeners.
    struct FakeRunner {
        lsof_installed: bool,
        listeners: Vec<u32>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn new(listeners: Vec<u32>) -> Self {
            Self {
                lsof_installed: true,
                listeners,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Runner for FakeRunner {
        fn run(&self, cmd: &Cmd) -> Result<Outcome, ExecError> {
            self.calls.lock().unwrap().push(cmd.to_string());

            if cmd.program() == "lsof" {
                if self.listeners.is_empty() {
                    return Ok(Outcome::exited(1));
                }
                let stdout = self
                    .listeners
                    .iter()
                    .map(|pid| format!("{pid}\n"))
                    .collect();
                return Ok(Outcome {
                    code: Some(0),
                    stdout,
                    stderr: String::new(),
                });
            }

            Ok(Outcome::exited(0))
        }

        fn is_available(&self, program: &str) -> bool {
            program != "lsof" || self.lsof_installed
        }
    }

    #[test]
    fn free_port_is_a_no_op() {
        let runner = FakeRunner::new(vec![]);

        let killed = PortReclaimer::new(&runner).reclaim(8000).unwrap();

        assert!(killed.is_empty());
        assert_eq!(
            runner.calls(),
            vec!["lsof -t -n -P -iTCP:8000 -sTCP:LISTEN".to_string()]
        );
    }

    #[test]
    fn terminates_every_listener() {
        let runner = FakeRunner::new(vec![4242, 4243]);

        let killed = PortReclaimer::new(&runner)
            .with_own_pid(1)
            .reclaim(9000)
            .unwrap();

        assert_eq!(killed, vec![4242, 4243]);
        assert!(runner.calls().contains(&"kill -9 4242".to_string()));
        assert!(runner.calls().contains(&"kill -9 4243".to_string()));
    }

    #[test]
    fn never_targets_own_process() {
        let runner = FakeRunner::new(vec![77, 4242]);

        let reclaimer = PortReclaimer::new(&runner).with_own_pid(77);
        let killed = reclaimer.reclaim(8000).unwrap();

        assert_eq!(killed, vec![4242]);
        assert!(!runner.calls().contains(&"kill -9 77".to_string()));
    }

    #[test]
    fn missing_lsof_is_reported_but_quiet_reclaim_succeeds() {
        let mut runner = FakeRunner::new(vec![4242]);
        runner.lsof_installed = false;
        let reclaimer = PortReclaimer::new(&runner);

        assert!(matches!(
            reclaimer.reclaim(8000),
            Err(PortError::LookupUnavailable(8000))
        ));
        assert!(reclaimer.reclaim_quietly(8000).is_empty());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn parses_pid_lines() {
        assert_eq!(parse_pids("123\n456\n\nnot-a-pid\n 789 \n"), vec![123, 456, 789]);
    }

    #[test]
    fn reclaiming_an_unused_port_on_this_machine_succeeds() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let killed = PortReclaimer::new(&crate::exec::SystemRunner).reclaim_quietly(port);

        assert!(killed.is_empty());
    }
}
