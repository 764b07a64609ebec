//! Preview server for the generated site.
//!
//! Serves the output directory over HTTP after freeing the port, frees it again
//! on Ctrl-C, and watches the site sources for the rebuild loop.

pub mod server;
pub mod watcher;

pub use server::{shutdown_signal, BoundServer, PreviewConfig, PreviewServer, ServerError};
pub use watcher::{ContentWatcher, WatchEvent};
