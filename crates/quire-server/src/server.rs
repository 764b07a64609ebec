//! Port-reclaiming static file server.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use quire_proc::{PortReclaimer, Runner};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

/// A killed listener can hold the socket for a moment.
const BIND_ATTEMPTS: u32 = 10;
const BIND_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Configuration for the preview server.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Directory to serve
    pub dir: PathBuf,

    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Open browser on start
    pub open: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("dist"),
            host: "127.0.0.1".to_string(),
            port: 8000,
            open: false,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Directory not found: {0}. Run 'quire build' first.")]
    DirectoryMissing(PathBuf),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("Server error: {0}")]
    ServeError(String),
}

/// Preview server for the generated site.
pub struct PreviewServer {
    config: PreviewConfig,
    runner: Arc<dyn Runner>,
}

impl PreviewServer {
    /// Create a new preview server.
    pub fn new(config: PreviewConfig, runner: Arc<dyn Runner>) -> Self {
        Self { config, runner }
    }

    /// Free the configured port and bind it.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        if !self.config.dir.is_dir() {
            return Err(ServerError::DirectoryMissing(self.config.dir.clone()));
        }

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.config.host, self.config.port))
            })?;

        // Port 0 asks the OS for a fresh port, nobody can be holding it.
        if addr.port() != 0 {
            reclaim(Arc::clone(&self.runner), addr.port()).await;
        }

        let listener = bind_with_retry(addr).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(BoundServer {
            config: self.config,
            runner: self.runner,
            listener,
            local_addr,
        })
    }

    /// Bind, then serve until Ctrl-C.
    pub async fn run(self) -> Result<(), ServerError> {
        self.bind().await?.serve_until(shutdown_signal()).await
    }
}

/// A preview server holding its port.
pub struct BoundServer {
    config: PreviewConfig,
    runner: Arc<dyn Runner>,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl BoundServer {
    /// Address actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve the directory until `shutdown` resolves, then free the port.
    pub async fn serve_until<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            config,
            runner,
            listener,
            local_addr,
        } = self;

        let app = Router::new().fallback_service(ServeDir::new(&config.dir));
        let url = format!("http://{}", local_addr);

        tracing::info!("Serving {} at {}", config.dir.display(), url);
        tracing::info!("Press Ctrl-C to stop");

        if config.open {
            let _ = open::that(&url);
        }

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()));

        // The listener is gone; take down anything else that grabbed the port.
        reclaim(runner, local_addr.port()).await;

        served
    }
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down..."),
        Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
    }
}

/// Terminate every other process on `port`, off the async workers.
async fn reclaim(runner: Arc<dyn Runner>, port: u16) {
    let result = tokio::task::spawn_blocking(move || {
        PortReclaimer::new(runner.as_ref()).reclaim_quietly(port)
    })
    .await;

    if let Err(e) = result {
        tracing::warn!("Port cleanup task failed: {}", e);
    }
}

async fn bind_with_retry(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let mut last_error = String::new();

    for attempt in 1..=BIND_ATTEMPTS {
        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) => {
                tracing::debug!("Bind attempt {} on {} failed: {}", attempt, addr, e);
                last_error = e.to_string();
                if attempt < BIND_ATTEMPTS {
                    tokio::time::sleep(BIND_RETRY_DELAY).await;
                }
            }
        }
    }

    Err(ServerError::BindError(addr, last_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_proc::{Cmd, ExecError, Outcome};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    /// Pretends a pid above the default pid_max holds the `occupant` listener.
    #[derive(Default)]
    struct FakePorts {
        occupant: Mutex<Option<std::net::TcpListener>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakePorts {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Runner for FakePorts {
        fn run(&self, cmd: &Cmd) -> Result<Outcome, ExecError> {
            self.calls.lock().unwrap().push(cmd.to_string());

            let mut occupant = self.occupant.lock().unwrap();
            if cmd.program() == "lsof" {
                if occupant.is_some() {
                    return Ok(Outcome {
                        code: Some(0),
                        stdout: "4194999\n".to_string(),
                        stderr: String::new(),
                    });
                }
                return Ok(Outcome::exited(1));
            }

            if cmd.to_string() == "kill -9 4194999" {
                *occupant = None;
            }
            Ok(Outcome::exited(0))
        }

        fn is_available(&self, _program: &str) -> bool {
            true
        }
    }

    fn site() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("index.html"), "<h1>IDEEP</h1>").unwrap();
        fs::create_dir_all(temp.path().join("syllabus")).unwrap();
        fs::write(temp.path().join("syllabus/index.html"), "<h1>Syllabus</h1>").unwrap();
        temp
    }

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn default_config_serves_dist_on_8000() {
        let config = PreviewConfig::default();

        assert_eq!(config.port, 8000);
        assert_eq!(config.dir, PathBuf::from("dist"));
        assert!(!config.open);
    }

    #[tokio::test]
    async fn refuses_missing_directory() {
        let temp = tempdir().unwrap();
        let config = PreviewConfig {
            dir: temp.path().join("dist"),
            port: 0,
            ..Default::default()
        };

        let result = PreviewServer::new(config, Arc::new(FakePorts::default()))
            .bind()
            .await;

        assert!(matches!(result, Err(ServerError::DirectoryMissing(_))));
    }

    #[tokio::test]
    async fn serves_files_and_frees_port_on_shutdown() {
        let temp = site();
        let runner = Arc::new(FakePorts::default());
        let config = PreviewConfig {
            dir: temp.path().to_path_buf(),
            port: 0,
            ..Default::default()
        };

        let server = PreviewServer::new(config, runner.clone()).bind().await.unwrap();
        let addr = server.local_addr();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_until(async move {
            let _ = rx.await;
        }));

        let index = get(addr, "/").await;
        assert!(index.starts_with("HTTP/1.1 200"), "{index}");
        assert!(index.contains("<h1>IDEEP</h1>"));

        let nested = get(addr, "/syllabus/").await;
        assert!(nested.contains("<h1>Syllabus</h1>"));

        let missing = get(addr, "/nope.html").await;
        assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();

        let lookup = format!("lsof -t -n -P -iTCP:{} -sTCP:LISTEN", addr.port());
        assert_eq!(runner.calls(), vec![lookup]);
    }

    #[tokio::test]
    async fn terminates_existing_holder_before_binding() {
        let temp = site();
        let occupant = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupant.local_addr().unwrap().port();

        let runner = Arc::new(FakePorts::default());
        *runner.occupant.lock().unwrap() = Some(occupant);

        let config = PreviewConfig {
            dir: temp.path().to_path_buf(),
            port,
            ..Default::default()
        };

        let server = PreviewServer::new(config, runner.clone()).bind().await.unwrap();

        assert_eq!(server.local_addr().port(), port);
        assert!(runner.occupant.lock().unwrap().is_none());
        assert!(runner.calls().contains(&"kill -9 4194999".to_string()));
    }

    #[tokio::test]
    async fn reports_port_that_cannot_be_freed() {
        let temp = site();
        let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = holder.local_addr().unwrap().port();

        // lsof finds nothing, so the port stays taken
        let config = PreviewConfig {
            dir: temp.path().to_path_buf(),
            port,
            ..Default::default()
        };

        let result = PreviewServer::new(config, Arc::new(FakePorts::default()))
            .bind()
            .await;

        assert!(matches!(result, Err(ServerError::BindError(_, _))));
        drop(holder);
    }
}
