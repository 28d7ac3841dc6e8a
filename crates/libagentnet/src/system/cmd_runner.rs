//! Command runner port for executing external OS commands.
//!
//! `ExecCmdRunner` spawns the program directly (no shell) and treats a
//! non-zero exit status as failure. `DryRunCmdRunner` only logs.

use std::process::Command;

use crate::error::{Error, Result};

/// Executes an argument vector and returns its standard output.
pub trait CmdRunner: Send + Sync {
    fn run_command(&self, args: &[String]) -> Result<String>;
}

/// Production runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecCmdRunner;

impl CmdRunner for ExecCmdRunner {
    fn run_command(&self, args: &[String]) -> Result<String> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| Error::command(args, "empty command"))?;

        log::debug!("Running: {}", args.join(" "));
        let output = Command::new(program)
            .args(rest)
            .output()
            .map_err(|e| Error::command(args, format!("failed to execute: {e}")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(Error::command(
                args,
                format!("{}: {}", output.status, stderr.trim()),
            ))
        }
    }
}

/// Logs each command at info level instead of running it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunCmdRunner;

impl CmdRunner for DryRunCmdRunner {
    fn run_command(&self, args: &[String]) -> Result<String> {
        log::info!("[dry-run] {}", args.join(" "));
        Ok(String::new())
    }
}
