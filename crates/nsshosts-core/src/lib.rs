//! # nsshosts-core
//!
//! Safe Rust engine behind the `envhosts` and `homehosts` NSS modules.
//!
//! A lookup scans a line-oriented hosts file (`<address> <name> [<alias>...]`)
//! and packs the result into one caller-supplied byte buffer, following the
//! reentrant `gethostbyname_r` convention: no allocation for the result, a
//! status code, and a retry signal when the buffer is too small.
//!
//! ```text
//! Scanner -> MatchEngine -> RecordPacker -> HostRecord (view into the buffer)
//!                 ^
//!           HostsDb (query shapes, family fallback, outcome mapping)
//! ```
//!
//! No `unsafe` code is permitted at the crate level.

#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod engine;
pub mod error;
pub mod inet;
pub mod query;
pub mod scanner;
pub mod source;
pub mod status;

pub use arena::{AliasOrder, ArenaError, HostRecord, RecordLayout, RecordPacker};
pub use config::{HostConf, LookupPolicy, ProbeOrder, SpoofMode};
pub use error::LookupError;
pub use inet::{Family, HostAddr};
pub use query::{HostsDb, HostsSession, Outcome, UnavailableReason};
pub use source::{
    EnvHostsFile, FileReader, FixedPath, HomeHostsFile, HostsSource, InMemory, SourceError,
};
pub use status::NssStatus;
