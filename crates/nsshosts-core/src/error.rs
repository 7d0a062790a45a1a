use std::io;

use thiserror::Error;

use crate::arena::ArenaError;
use crate::source::SourceError;

/// Everything that can stop a lookup before a record is produced.
///
/// [`crate::Outcome`] folds these into the NSS status triple.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("hosts file read failed: {0}")]
    Read(#[from] io::Error),
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error("no matching hosts entry")]
    NotFound,
    #[error("unsupported address family {0}")]
    UnsupportedFamily(i32),
    #[error("no enumeration session is open")]
    NoSession,
}

impl LookupError {
    /// True when retrying with a larger buffer may succeed.
    pub fn is_too_small(&self) -> bool {
        matches!(self, Self::Arena(ArenaError::TooSmall { .. }))
    }
}
