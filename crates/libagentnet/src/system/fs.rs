//! File system port.
//!
//! `OsFileSystem` can be rooted under a directory (an image being prepared,
//! a chroot, a test fixture). Callers always speak in absolute host paths
//! such as `/etc/resolv.conf`; the root is applied underneath.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Whole-file access to configuration files and device attributes.
pub trait FileSystem: Send + Sync {
    /// Read a file as text, replacing invalid UTF-8. A missing file is
    /// `Ok(None)`, not an error.
    fn read_file(&self, path: &Path) -> Result<Option<String>>;

    /// Replace the whole content of `path`, creating parent directories.
    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// Expand a pattern whose last component may contain `*` and `?`.
    /// Results are sorted; a missing parent directory yields no matches.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;
}

// ---------------------------------------------------------------------------
// Host implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct OsFileSystem {
    root: Option<PathBuf>,
}

impl OsFileSystem {
    /// Operate directly on the host's `/`.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Operate on the tree below `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn host_path(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.strip_prefix("/").unwrap_or(path)),
            None => path.to_path_buf(),
        }
    }
}

impl FileSystem for OsFileSystem {
    fn read_file(&self, path: &Path) -> Result<Option<String>> {
        match fs::read(self.host_path(path)) {
            Ok(bytes) => Ok(Some(decode_lossy(path, bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::file_io(path, e)),
        }
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        let target = self.host_path(path);
        write_atomic(&target, contents).map_err(|e| Error::file_io(path, e))?;
        log::debug!("Wrote {} ({} bytes)", path.display(), contents.len());
        Ok(())
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let (dir, name_pattern) = match pattern.rsplit_once('/') {
            Some(("", name)) => ("/", name),
            Some((dir, name)) => (dir, name),
            None => (".", pattern),
        };
        let logical_dir = Path::new(dir);
        let entries = match fs::read_dir(self.host_path(logical_dir)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::file_io(logical_dir, e)),
        };

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::file_io(logical_dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if glob_match(name_pattern, &name) {
                matches.push(logical_dir.join(name));
            }
        }
        matches.sort();
        Ok(matches)
    }
}

/// Invalid UTF-8 sequences become U+FFFD, so such a file never compares
/// equal to rendered configuration and gets rewritten.
fn decode_lossy(path: &Path, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("{} is not valid UTF-8", path.display());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Write through a sibling temp file and rename it over the target so
/// readers never observe a half-written file.
fn write_atomic(target: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp = target.with_file_name(format!(".{file_name}.agent.tmp"));

    let mut file = fs::File::create(&tmp)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Match one path component against `*` (any run) and `?` (one character).
/// Brackets and escapes are not special.
pub(crate) fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    matches_component(&pattern, &name)
}

fn matches_component(pattern: &[char], name: &[char]) -> bool {
    match (pattern, name) {
        ([], []) => true,
        (['*', '*', ..], _) => matches_component(&pattern[1..], name),
        (['*', rest @ ..], _) => (0..=name.len()).any(|skip| matches_component(rest, &name[skip..])),
        (['?', rest @ ..], [_, tail @ ..]) => matches_component(rest, tail),
        ([p, rest @ ..], [c, tail @ ..]) if p == c => matches_component(rest, tail),
        _ => false,
    }
}
