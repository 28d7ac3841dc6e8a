//! Ports to the host operating system.
//!
//! Configurators never touch `std::fs` or `std::process` directly; they go
//! through [`FileSystem`] and [`CmdRunner`] so the same logic can run against
//! the live host, a rooted image directory, or the in-memory fakes.

pub mod cmd_runner;
pub mod fakes;
pub mod fs;
pub mod lock_ext;

pub use cmd_runner::{CmdRunner, DryRunCmdRunner, ExecCmdRunner};
pub use fs::{FileSystem, OsFileSystem};
