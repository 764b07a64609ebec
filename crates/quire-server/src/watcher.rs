//! Content directory watching for the rebuild loop.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Quiet period after the last change before events are forwarded.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Extensions of LaTeX intermediates, written and removed by every logo build.
const IGNORED_EXTENSIONS: &[&str] = &["aux", "log", "dvi", "out"];

/// Events emitted by the content watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A page source (Markdown or LaTeX) was created or modified
    PageChanged(PathBuf),

    /// Any other file was created or modified
    Modified(PathBuf),

    /// A file was deleted
    Deleted(PathBuf),
}

impl WatchEvent {
    /// Path the event refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::PageChanged(p) | Self::Modified(p) | Self::Deleted(p) => p,
        }
    }
}

/// Watches directories and forwards debounced change events.
pub struct ContentWatcher {
    _watcher: RecommendedWatcher,
}

impl ContentWatcher {
    /// Create a watcher for the given paths.
    ///
    /// Returns the watcher and a channel to receive events. Events are held
    /// until no change has arrived for 100ms, then forwarded once per path.
    /// Paths that do not exist are skipped.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            } else {
                tracing::warn!("Not watching {}: path does not exist", path.display());
            }
        }

        std::thread::spawn(move || {
            let mut pending: Vec<WatchEvent> = Vec::new();

            loop {
                // Hold changes until the tree has been quiet for DEBOUNCE.
                let received = if pending.is_empty() {
                    sync_rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
                } else {
                    sync_rx.recv_timeout(DEBOUNCE)
                };

                match received {
                    Ok(event) => {
                        for e in event
                            .paths
                            .iter()
                            .filter_map(|path| classify_event(path, &event.kind))
                        {
                            if !pending.contains(&e) {
                                pending.push(e);
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        for e in pending.drain(..) {
                            if async_tx.blocking_send(e).is_err() {
                                return;
                            }
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        for e in pending.drain(..) {
                            let _ = async_tx.blocking_send(e);
                        }
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event into a WatchEvent.
fn classify_event(path: &Path, kind: &notify::EventKind) -> Option<WatchEvent> {
    use notify::EventKind;

    if is_editor_noise(path) {
        return None;
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if IGNORED_EXTENSIONS.contains(&ext) {
        return None;
    }

    match kind {
        EventKind::Remove(_) => Some(WatchEvent::Deleted(path.to_path_buf())),
        EventKind::Create(_) | EventKind::Modify(_) => {
            if matches!(ext, "md" | "markdown" | "tex") {
                Some(WatchEvent::PageChanged(path.to_path_buf()))
            } else {
                Some(WatchEvent::Modified(path.to_path_buf()))
            }
        }
        _ => None,
    }
}

/// Swap and backup files written by editors.
fn is_editor_noise(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.starts_with(".#") || name.ends_with('~') || name.ends_with(".swp") || name.ends_with(".swx")
}
