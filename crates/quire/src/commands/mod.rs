//! CLI command implementations.

pub mod build;
pub mod clean;
pub mod dev;
pub mod init;
pub mod kill_port;
pub mod logo;
pub mod preview;
pub mod serve;
