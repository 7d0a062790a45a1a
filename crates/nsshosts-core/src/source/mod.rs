//! Where a hosts stream comes from.
//!
//! The query driver only needs "an open, seekable stream or a reason there is
//! none". Each NSS module picks its file through one of these strategies.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

/// Longest accepted path, terminator included (`PATH_MAX`).
pub const PATH_MAX: usize = 4096;

/// Environment variable read by [`EnvHostsFile`].
pub const HOSTS_FILE_VAR: &str = "HOSTS_FILE";

/// Per-user hosts file name under `$HOME`.
pub const HOME_HOSTS_NAME: &str = ".hosts";

/// Reader type produced by the file-backed sources.
pub type FileReader = BufReader<File>;

/// Why no stream could be opened. Every variant is a soft failure: the
/// caller may try again later or fall through to the next NSS module.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0} is not set")]
    Unset(&'static str),
    #[error("hosts path is {0} bytes, longer than PATH_MAX")]
    PathTooLong(usize),
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait HostsSource {
    type Reader: BufRead + Seek;

    /// Opens a fresh stream positioned at its first byte.
    fn open(&self) -> Result<Self::Reader, SourceError>;
}

/// Hosts file named by `$HOSTS_FILE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvHostsFile;

impl HostsSource for EnvHostsFile {
    type Reader = FileReader;

    fn open(&self) -> Result<FileReader, SourceError> {
        let path = env::var_os(HOSTS_FILE_VAR)
            .filter(|value| !value.is_empty())
            .ok_or(SourceError::Unset(HOSTS_FILE_VAR))?;
        open_file(&checked_path(path)?)
    }
}

/// `$HOME/.hosts`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HomeHostsFile;

impl HostsSource for HomeHostsFile {
    type Reader = FileReader;

    fn open(&self) -> Result<FileReader, SourceError> {
        let home = env::var_os("HOME")
            .filter(|value| !value.is_empty())
            .ok_or(SourceError::Unset("HOME"))?;
        let mut path = PathBuf::from(home);
        path.push(HOME_HOSTS_NAME);
        open_file(&checked_path(path.into_os_string())?)
    }
}

/// A path fixed at construction time.
#[derive(Debug, Clone)]
pub struct FixedPath(pub PathBuf);

impl FixedPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl HostsSource for FixedPath {
    type Reader = FileReader;

    fn open(&self) -> Result<FileReader, SourceError> {
        open_file(&checked_path(self.0.clone().into_os_string())?)
    }
}

/// Hosts text held in memory. Cloning shares the bytes.
#[derive(Debug, Clone)]
pub struct InMemory(Arc<[u8]>);

impl InMemory {
    pub fn new(text: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(text.as_ref()))
    }
}

impl HostsSource for InMemory {
    type Reader = Cursor<Arc<[u8]>>;

    fn open(&self) -> Result<Self::Reader, SourceError> {
        Ok(Cursor::new(Arc::clone(&self.0)))
    }
}

fn checked_path(path: OsString) -> Result<PathBuf, SourceError> {
    let len = path.len();
    if len >= PATH_MAX {
        return Err(SourceError::PathTooLong(len));
    }
    Ok(PathBuf::from(path))
}

fn open_file(path: &Path) -> Result<FileReader, SourceError> {
    debug!(path = %path.display(), "opening hosts file");
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })
}
