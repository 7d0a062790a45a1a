//! NSS status codes and the secondary `errno` / `h_errno` details.
//!
//! Values match glibc on Linux so the ABI layer can hand them to callers
//! unchanged.

/// Result of an NSS backend call (`enum nss_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum NssStatus {
    /// Transient failure, or the buffer was too small (`errno == ERANGE`).
    TryAgain = -2,
    /// The backend cannot serve this request.
    Unavail = -1,
    /// The entry does not exist.
    NotFound = 0,
    /// The result record was filled.
    Success = 1,
}

impl NssStatus {
    /// Raw integer as returned by `_nss_*` entry points.
    #[inline]
    pub const fn as_raw(self) -> i32 {
        self as i32
    }
}

// `h_errno` values from `<netdb.h>`.
pub const NETDB_INTERNAL: i32 = -1;
pub const NETDB_SUCCESS: i32 = 0;
pub const HOST_NOT_FOUND: i32 = 1;
pub const TRY_AGAIN: i32 = 2;
pub const NO_RECOVERY: i32 = 3;

// `errno` values reported through `*errnop`.
pub const ENOENT: i32 = 2;
pub const EBADF: i32 = 9;
pub const EAGAIN: i32 = 11;
pub const EINVAL: i32 = 22;
pub const ERANGE: i32 = 34;
pub const EAFNOSUPPORT: i32 = 97;
