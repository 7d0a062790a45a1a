// Every export takes raw pointers from glibc's NSS dispatcher; the contract is
// the one documented for `_nss_files_gethostbyname_r` and friends.
#![allow(clippy::missing_safety_doc)]
//! # nsshosts-abi
//!
//! `extern "C"` NSS entry points for two hosts-file modules:
//!
//! - `envhosts` reads the file named by `$HOSTS_FILE`.
//! - `homehosts` reads `$HOME/.hosts`.
//!
//! Built as a `cdylib`, the library can be installed as `libnss_envhosts.so.2`
//! or `libnss_homehosts.so.2` and listed on the `hosts:` line of
//! `/etc/nsswitch.conf`.
//!
//! ```text
//! glibc NSS -> _nss_<module>_* (this crate) -> HostsDb (nsshosts-core) -> struct hostent
//! ```
//!
//! All parsing and packing happens in safe code; this crate only turns raw
//! pointers into slices and the resulting record offsets back into pointers.

mod nss;

pub mod envhosts_abi;
pub mod homehosts_abi;

pub use nss::policy;
