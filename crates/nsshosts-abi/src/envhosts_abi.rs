//! `envhosts`: hosts entries from the file named by `$HOSTS_FILE`.
//!
//! An unset, empty or overlong `$HOSTS_FILE` is a soft failure (TRYAGAIN with
//! `EAGAIN`), so the dispatcher falls through to the next module.

use std::ffi::{c_char, c_int, c_void};

use nsshosts_core::EnvHostsFile;

use crate::nss::NssModule;

static MODULE: NssModule<EnvHostsFile> = NssModule::new("envhosts", EnvHostsFile);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn _nss_envhosts_gethostbyname_r(
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
pub unsafe extern "C" fn _nss_envhosts_gethostbyname2_r(
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
pub unsafe extern "C" fn _nss_envhosts_gethostbyaddr_r(
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
pub extern "C" fn _nss_envhosts_sethostent(stayopen: c_int) -> c_int {
    MODULE.sethostent(stayopen)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn _nss_envhosts_gethostent_r(
    result: *mut libc::hostent,
    buffer: *mut c_char,
    buflen: libc::size_t,
    errnop: *mut c_int,
    h_errnop: *mut c_int,
) -> c_int {
    unsafe { MODULE.gethostent_r(result, buffer, buflen, errnop, h_errnop) }
}

#[unsafe(no_mangle)]
pub extern "C" fn _nss_envhosts_endhostent() -> c_int {
    MODULE.endhostent()
}
