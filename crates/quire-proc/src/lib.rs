//! External process plumbing for quire.
//!
//! Every tool quire drives (the site generator, LaTeX compilers, SVG converters,
//! `lsof` and `kill`) is described as a [`Cmd`] and executed through a
//! [`Runner`], so callers can swap in a fake runner under test.

pub mod exec;
pub mod generator;
pub mod port;

pub use exec::{Cmd, ExecError, Outcome, Runner, SystemRunner};
pub use generator::{GenerateResult, Generator, GeneratorError};
pub use port::{PortError, PortReclaimer};
