//! `homehosts`: per-user hosts entries from `$HOME/.hosts`.
//!
//! Without `$HOME`, or when the file cannot be opened, every query is a soft
//! failure.

use std::ffi::{c_char, c_int, c_void};

use nsshosts_core::HomeHostsFile;

use crate::nss::NssModule;

static MODULE: NssModule<HomeHostsFile> = NssModule::new("homehosts", HomeHostsFile);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn _nss_homehosts_gethostbyname_r(
    name: *const c_char,
    result: *mut libc::hostent,
    buffer: *mut c_char,
    buflen: libc::size_t,
    errnop: *mut c_int,
    h_errnop: *mut c_int,
) -> c_int {
    unsafe { MODULE.gethostbyname_r(name, result, buffer, buflen, errnop, h_errnop) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn _nss_homehosts_gethostbyname2_r(
    name: *const c_char,
    af: c_int,
    result: *mut libc::hostent,
    buffer: *mut c_char,
    buflen: libc::size_t,
    errnop: *mut c_int,
    h_errnop: *mut c_int,
) -> c_int {
    unsafe { MODULE.gethostbyname2_r(name, af, result, buffer, buflen, errnop, h_errnop) }
}

#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn _nss_homehosts_gethostbyaddr_r(
    addr: *const c_void,
    len: libc::socklen_t,
    af: c_int,
    result: *mut libc::hostent,
    buffer: *mut c_char,
    buflen: libc::size_t,
    errnop: *mut c_int,
    h_errnop: *mut c_int,
) -> c_int {
    unsafe { MODULE.gethostbyaddr_r(addr, len, af, result, buffer, buflen, errnop, h_errnop) }
}

#[unsafe(no_mangle)]
pub extern "C" fn _nss_homehosts_sethostent(stayopen: c_int) -> c_int {
    MODULE.sethostent(stayopen)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn _nss_homehosts_gethostent_r(
    result: *mut libc::hostent,
    buffer: *mut c_char,
    buflen: libc::size_t,
    errnop: *mut c_int,
    h_errnop: *mut c_int,
) -> c_int {
    unsafe { MODULE.gethostent_r(result, buffer, buflen, errnop, h_errnop) }
}

#[unsafe(no_mangle)]
pub extern "C" fn _nss_homehosts_endhostent() -> c_int {
    MODULE.endhostent()
}
