//! In-memory doubles for the OS ports.
//!
//! Both fakes are `Send + Sync` so they can be shared with the detached ARP
//! announcement thread, and both record what happened to them so tests can
//! assert on writes and on the exact command history.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::cmd_runner::CmdRunner;
use super::fs::{FileSystem, glob_match};
use super::lock_ext::MutexExt;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// FakeFileSystem
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeFileSystem {
    files: Mutex<HashMap<PathBuf, String>>,
    globs: Mutex<HashMap<String, Vec<PathBuf>>>,
    writes: Mutex<Vec<PathBuf>>,
    write_errors: Mutex<HashMap<PathBuf, String>>,
}

impl FakeFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without counting it as a write.
    pub fn set_file(&self, path: impl Into<PathBuf>, contents: &str) {
        self.files
            .lock_poisoned()
            .insert(path.into(), contents.to_string());
    }

    /// Pin the result of `glob(pattern)`. Unpinned patterns are matched
    /// against the seeded files.
    pub fn set_glob(&self, pattern: &str, paths: &[&str]) {
        self.globs.lock_poisoned().insert(
            pattern.to_string(),
            paths.iter().map(PathBuf::from).collect(),
        );
    }

    /// Make every subsequent write to `path` fail.
    pub fn fail_writes_to(&self, path: impl Into<PathBuf>, reason: &str) {
        self.write_errors
            .lock_poisoned()
            .insert(path.into(), reason.to_string());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.lock_poisoned().get(path.as_ref()).cloned()
    }

    /// Paths written through the port, in order.
    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.writes.lock_poisoned().clone()
    }
}

impl FileSystem for FakeFileSystem {
    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.contents(path))
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(reason) = self.write_errors.lock_poisoned().get(path) {
            return Err(Error::file_io(
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, reason.clone()),
            ));
        }
        self.writes.lock_poisoned().push(path.to_path_buf());
        self.set_file(path, contents);
        Ok(())
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        if let Some(paths) = self.globs.lock_poisoned().get(pattern) {
            return Ok(paths.clone());
        }
        // Seeded files imply their parent directories, so `/a/b/address`
        // makes `/a/b` visible to `/a/*`.
        let (dir, name_pattern) = pattern.rsplit_once('/').unwrap_or(("", pattern));
        let mut matches: Vec<PathBuf> = Vec::new();
        for file in self.files.lock_poisoned().keys() {
            for candidate in file.ancestors() {
                let (Some(parent), Some(name)) = (candidate.parent(), candidate.file_name())
                else {
                    continue;
                };
                if parent.to_string_lossy() == dir
                    && glob_match(name_pattern, &name.to_string_lossy())
                    && !matches.iter().any(|m| m == candidate)
                {
                    matches.push(candidate.to_path_buf());
                }
            }
        }
        matches.sort();
        Ok(matches)
    }
}

// ---------------------------------------------------------------------------
// FakeCmdRunner
// ---------------------------------------------------------------------------

/// Records every argument vector in call order. Commands registered with
/// [`FakeCmdRunner::fail_command`] return `CommandExecution` errors.
#[derive(Debug, Default)]
pub struct FakeCmdRunner {
    commands: Mutex<Vec<Vec<String>>>,
    failures: Mutex<HashMap<String, String>>,
}

impl FakeCmdRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_command(&self, args: &[&str], reason: &str) {
        self.failures
            .lock_poisoned()
            .insert(args.join(" "), reason.to_string());
    }

    pub fn run_commands(&self) -> Vec<Vec<String>> {
        self.commands.lock_poisoned().clone()
    }

    pub fn command_count(&self) -> usize {
        self.commands.lock_poisoned().len()
    }
}

impl CmdRunner for FakeCmdRunner {
    fn run_command(&self, args: &[String]) -> Result<String> {
        self.commands.lock_poisoned().push(args.to_vec());
        match self.failures.lock_poisoned().get(&args.join(" ")) {
            Some(reason) => Err(Error::command(args, reason.clone())),
            None => Ok(String::new()),
        }
    }
}
