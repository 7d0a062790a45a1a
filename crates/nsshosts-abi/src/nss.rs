//! Shared plumbing behind the per-module `_nss_*` exports.

use std::ffi::{CStr, c_char, c_int, c_void};
use std::ptr;
use std::sync::OnceLock;

use nsshosts_core::status::{EINVAL, NO_RECOVERY};
use nsshosts_core::{
    FileReader, HostConf, HostsDb, HostsSession, HostsSource, LookupPolicy, NssStatus, Outcome,
};
use parking_lot::Mutex;
use tracing::debug;

static POLICY: OnceLock<LookupPolicy> = OnceLock::new();

/// Lookup policy shared by both modules, read from host.conf on first use.
pub fn policy() -> LookupPolicy {
    *POLICY.get_or_init(|| LookupPolicy::from_host_conf(&HostConf::load()))
}

/// One NSS module: a hosts source plus the enumeration session that
/// `sethostent`/`gethostent_r`/`endhostent` share.
pub(crate) struct NssModule<S> {
    name: &'static str,
    source: S,
    session: Mutex<Option<HostsSession<FileReader>>>,
}

impl<S> NssModule<S>
where
    S: HostsSource<Reader = FileReader> + Clone,
{
    pub(crate) const fn new(name: &'static str, source: S) -> Self {
        Self {
            name,
            source,
            session: Mutex::new(None),
        }
    }

    fn db(&self) -> HostsDb<S> {
        HostsDb::new(self.source.clone(), policy())
    }

    pub(crate) unsafe fn gethostbyname_r(
        &self,
        name: *const c_char,
        result: *mut libc::hostent,
        buffer: *mut c_char,
        buflen: libc::size_t,
        errnop: *mut c_int,
        h_errnop: *mut c_int,
    ) -> c_int {
        if name.is_null() || result.is_null() || buffer.is_null() {
            return unsafe { reject(errnop, h_errnop) };
        }
        // SAFETY: name is non-null and NUL-terminated per the NSS contract.
        let query = unsafe { CStr::from_ptr(name) }.to_bytes();
        // SAFETY: buffer is non-null and caller-owned for buflen bytes.
        let buf = unsafe { buffer_slice(buffer, buflen) };
        let outcome = self.db().lookup_by_name(query, buf);
        debug!(module = self.name, status = ?outcome.status(), "gethostbyname_r");
        unsafe { deliver(&outcome, buffer, result, errnop, h_errnop) }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) unsafe fn gethostbyname2_r(
        &self,
        name: *const c_char,
        af: c_int,
        result: *mut libc::hostent,
        buffer: *mut c_char,
        buflen: libc::size_t,
        errnop: *mut c_int,
        h_errnop: *mut c_int,
    ) -> c_int {
        if name.is_null() || result.is_null() || buffer.is_null() {
            return unsafe { reject(errnop, h_errnop) };
        }
        // SAFETY: name is non-null and NUL-terminated per the NSS contract.
        let query = unsafe { CStr::from_ptr(name) }.to_bytes();
        // SAFETY: buffer is non-null and caller-owned for buflen bytes.
        let buf = unsafe { buffer_slice(buffer, buflen) };
        let outcome = self.db().lookup_by_name_and_family(query, af, buf);
        debug!(module = self.name, af, status = ?outcome.status(), "gethostbyname2_r");
        unsafe { deliver(&outcome, buffer, result, errnop, h_errnop) }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) unsafe fn gethostbyaddr_r(
        &self,
        addr: *const c_void,
        len: libc::socklen_t,
        af: c_int,
        result: *mut libc::hostent,
        buffer: *mut c_char,
        buflen: libc::size_t,
        errnop: *mut c_int,
        h_errnop: *mut c_int,
    ) -> c_int {
        if addr.is_null() || result.is_null() || buffer.is_null() {
            return unsafe { reject(errnop, h_errnop) };
        }
        let len = len as usize;
        // SAFETY: addr points at `len` readable bytes per the NSS contract.
        let query = unsafe { std::slice::from_raw_parts(addr.cast::<u8>(), len) };
        // SAFETY: buffer is non-null and caller-owned for buflen bytes.
        let buf = unsafe { buffer_slice(buffer, buflen) };
        let outcome = self.db().lookup_by_address(query, len, af, buf);
        debug!(module = self.name, af, len, status = ?outcome.status(), "gethostbyaddr_r");
        unsafe { deliver(&outcome, buffer, result, errnop, h_errnop) }
    }

    /// Opens (or reopens) the enumeration session at the first entry.
    pub(crate) fn sethostent(&self, stayopen: c_int) -> c_int {
        let mut session = self.session.lock();
        match self.db().open() {
            Ok(opened) => {
                *session = Some(opened);
                debug!(module = self.name, stayopen, "sethostent");
                NssStatus::Success.as_raw()
            }
            Err(outcome) => {
                *session = None;
                debug!(module = self.name, status = ?outcome.status(), "sethostent failed");
                outcome.status().as_raw()
            }
        }
    }

    pub(crate) unsafe fn gethostent_r(
        &self,
        result: *mut libc::hostent,
        buffer: *mut c_char,
        buflen: libc::size_t,
        errnop: *mut c_int,
        h_errnop: *mut c_int,
    ) -> c_int {
        if result.is_null() || buffer.is_null() {
            return unsafe { reject(errnop, h_errnop) };
        }
        // SAFETY: buffer is non-null and caller-owned for buflen bytes.
        let buf = unsafe { buffer_slice(buffer, buflen) };
        let mut session = self.session.lock();
        let outcome = self.db().next(session.as_mut(), buf);
        debug!(module = self.name, status = ?outcome.status(), "gethostent_r");
        unsafe { deliver(&outcome, buffer, result, errnop, h_errnop) }
    }

    /// Closes the enumeration session; UNAVAIL when none is open.
    pub(crate) fn endhostent(&self) -> c_int {
        match self.session.lock().take() {
            Some(session) => {
                self.db().close(session);
                NssStatus::Success.as_raw()
            }
            None => NssStatus::Unavail.as_raw(),
        }
    }
}

/// Views the caller's buffer as a byte slice.
///
/// # Safety
///
/// `buffer` must be non-null and valid for writes of `buflen` bytes for the
/// duration of the returned borrow.
unsafe fn buffer_slice<'a>(buffer: *mut c_char, buflen: libc::size_t) -> &'a mut [u8] {
    // SAFETY: guaranteed by the caller.
    unsafe { std::slice::from_raw_parts_mut(buffer.cast::<u8>(), buflen) }
}

/// Copies an outcome into the caller's out-parameters and returns its status.
///
/// A successful record lives in `buffer`; its offsets become the `hostent`
/// pointers.
unsafe fn deliver(
    outcome: &Outcome<'_>,
    buffer: *mut c_char,
    result: *mut libc::hostent,
    errnop: *mut c_int,
    h_errnop: *mut c_int,
) -> c_int {
    if let Some(record) = outcome.record() {
        let layout = record.layout();
        // SAFETY: every offset lies inside the caller's buffer and the
        // pointer tables are pointer-aligned; result is non-null.
        unsafe {
            *result = libc::hostent {
                h_name: buffer.add(layout.name),
                h_aliases: buffer.add(layout.aliases).cast::<*mut c_char>(),
                h_addrtype: layout.family.af(),
                h_length: layout.family.addr_len() as c_int,
                h_addr_list: buffer.add(layout.addr_list).cast::<*mut c_char>(),
            };
        }
    }
    unsafe { set_details(errnop, h_errnop, outcome.errno(), outcome.h_errno()) };
    outcome.status().as_raw()
}

/// Null argument: UNAVAIL with `EINVAL`.
unsafe fn reject(errnop: *mut c_int, h_errnop: *mut c_int) -> c_int {
    unsafe { set_details(errnop, h_errnop, EINVAL, NO_RECOVERY) };
    NssStatus::Unavail.as_raw()
}

unsafe fn set_details(errnop: *mut c_int, h_errnop: *mut c_int, errno: c_int, h_errno: c_int) {
    if !errnop.is_null() {
        // SAFETY: non-null out-parameter supplied by the caller.
        unsafe { ptr::write(errnop, errno) };
    }
    if !h_errnop.is_null() {
        // SAFETY: non-null out-parameter supplied by the caller.
        unsafe { ptr::write(h_errnop, h_errno) };
    }
}
