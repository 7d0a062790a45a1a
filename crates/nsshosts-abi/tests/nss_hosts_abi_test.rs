use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::fs;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use nsshosts_abi::envhosts_abi::{
    _nss_envhosts_endhostent, _nss_envhosts_gethostbyaddr_r, _nss_envhosts_gethostbyname_r,
    _nss_envhosts_gethostbyname2_r, _nss_envhosts_gethostent_r, _nss_envhosts_sethostent,
};
use nsshosts_abi::homehosts_abi::{
    _nss_homehosts_endhostent, _nss_homehosts_gethostbyname_r, _nss_homehosts_gethostent_r,
    _nss_homehosts_sethostent,
};
use nsshosts_core::status::{
    EAFNOSUPPORT, EAGAIN, EBADF, EINVAL, ENOENT, ERANGE, HOST_NOT_FOUND, NETDB_INTERNAL,
    NETDB_SUCCESS, NO_RECOVERY, TRY_AGAIN,
};
use nsshosts_core::{NssStatus, inet};

static TEST_LOCK: Mutex<()> = Mutex::new(());
static TEST_SEQ: AtomicU64 = AtomicU64::new(0);

const SUCCESS: c_int = NssStatus::Success as c_int;
const NOTFOUND: c_int = NssStatus::NotFound as c_int;
const TRYAGAIN: c_int = NssStatus::TryAgain as c_int;
const UNAVAIL: c_int = NssStatus::Unavail as c_int;

fn temp_path(prefix: &str) -> PathBuf {
    let seq = TEST_SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "nsshosts-{prefix}-{}-{seq}",
        std::process::id()
    ))
}

fn write_file(path: &Path, content: &[u8]) {
    fs::write(path, content).expect("temporary hosts file should be writable");
}

fn with_hosts_file(content: &[u8]) -> PathBuf {
    let path = temp_path("hosts");
    write_file(&path, content);
    // SAFETY: integration tests serialize env mutation via TEST_LOCK.
    unsafe { std::env::set_var("HOSTS_FILE", &path) };
    path
}

struct Call {
    hostent: libc::hostent,
    buffer: Vec<c_char>,
    errno: c_int,
    h_errno: c_int,
}

impl Call {
    fn new(buflen: usize) -> Self {
        Self {
            hostent: libc::hostent {
                h_name: ptr::null_mut(),
                h_aliases: ptr::null_mut(),
                h_addrtype: 0,
                h_length: 0,
                h_addr_list: ptr::null_mut(),
            },
            buffer: vec![0; buflen],
            errno: -1,
            h_errno: -1,
        }
    }

    fn name(&self) -> String {
        // SAFETY: only called after SUCCESS, when h_name points into `buffer`.
        unsafe { CStr::from_ptr(self.hostent.h_name) }
            .to_string_lossy()
            .into_owned()
    }

    fn aliases(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut idx = 0usize;
        loop {
            // SAFETY: h_aliases is a NULL-terminated table inside `buffer`.
            let alias = unsafe { *self.hostent.h_aliases.add(idx) };
            if alias.is_null() {
                break;
            }
            // SAFETY: alias pointers are C strings inside `buffer`.
            out.push(unsafe { CStr::from_ptr(alias) }.to_string_lossy().into_owned());
            idx += 1;
        }
        out
    }

    fn addresses(&self) -> Vec<Vec<u8>> {
        let len = self.hostent.h_length as usize;
        let mut out = Vec::new();
        let mut idx = 0usize;
        loop {
            // SAFETY: h_addr_list is a NULL-terminated table inside `buffer`.
            let addr = unsafe { *self.hostent.h_addr_list.add(idx) };
            if addr.is_null() {
                break;
            }
            // SAFETY: each entry points at h_length bytes inside `buffer`.
            out.push(unsafe { std::slice::from_raw_parts(addr.cast::<u8>(), len) }.to_vec());
            idx += 1;
        }
        out
    }

    fn by_name(&mut self, name: &str) -> c_int {
        let name = CString::new(name).unwrap();
        unsafe {
            _nss_envhosts_gethostbyname_r(
                name.as_ptr(),
                &mut self.hostent,
                self.buffer.as_mut_ptr(),
                self.buffer.len(),
                &mut self.errno,
                &mut self.h_errno,
            )
        }
    }

    fn by_name2(&mut self, name: &str, af: c_int) -> c_int {
        let name = CString::new(name).unwrap();
        unsafe {
            _nss_envhosts_gethostbyname2_r(
                name.as_ptr(),
                af,
                &mut self.hostent,
                self.buffer.as_mut_ptr(),
                self.buffer.len(),
                &mut self.errno,
                &mut self.h_errno,
            )
        }
    }

    fn by_addr(&mut self, addr: &[u8], af: c_int) -> c_int {
        unsafe {
            _nss_envhosts_gethostbyaddr_r(
                addr.as_ptr().cast::<c_void>(),
                addr.len() as libc::socklen_t,
                af,
                &mut self.hostent,
                self.buffer.as_mut_ptr(),
                self.buffer.len(),
                &mut self.errno,
                &mut self.h_errno,
            )
        }
    }

    fn next_env(&mut self) -> c_int {
        unsafe {
            _nss_envhosts_gethostent_r(
                &mut self.hostent,
                self.buffer.as_mut_ptr(),
                self.buffer.len(),
                &mut self.errno,
                &mut self.h_errno,
            )
        }
    }

    fn next_home(&mut self) -> c_int {
        unsafe {
            _nss_homehosts_gethostent_r(
                &mut self.hostent,
                self.buffer.as_mut_ptr(),
                self.buffer.len(),
                &mut self.errno,
                &mut self.h_errno,
            )
        }
    }
}

#[test]
fn core_constants_match_libc() {
    assert_eq!(ENOENT, libc::ENOENT);
    assert_eq!(EBADF, libc::EBADF);
    assert_eq!(EAGAIN, libc::EAGAIN);
    assert_eq!(EINVAL, libc::EINVAL);
    assert_eq!(ERANGE, libc::ERANGE);
    assert_eq!(EAFNOSUPPORT, libc::EAFNOSUPPORT);
    assert_eq!(inet::AF_INET, libc::AF_INET);
    assert_eq!(inet::AF_INET6, libc::AF_INET6);
}

#[test]
fn gethostbyname2_fills_hostent_from_env_file() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    let path = with_hosts_file(b"# comment\n10.0.0.1 foo bar.baz\n");

    let mut call = Call::new(1024);
    assert_eq!(call.by_name2("foo", libc::AF_INET), SUCCESS);
    assert_eq!(call.name(), "foo");
    assert_eq!(call.aliases(), vec!["bar.baz"]);
    assert_eq!(call.addresses(), vec![vec![10, 0, 0, 1]]);
    assert_eq!(call.hostent.h_addrtype, libc::AF_INET);
    assert_eq!(call.hostent.h_length, 4);
    assert_eq!(call.errno, 0);
    assert_eq!(call.h_errno, NETDB_SUCCESS);

    let range = call.buffer.as_ptr_range();
    assert!(range.contains(&call.hostent.h_name.cast_const()));

    let _ = fs::remove_file(path);
}

#[test]
fn gethostbyname_falls_back_to_ipv6() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    let path = with_hosts_file(b"::1 six\n");

    let mut call = Call::new(1024);
    assert_eq!(call.by_name("SIX"), SUCCESS);
    assert_eq!(call.name(), "six");
    assert_eq!(call.hostent.h_addrtype, libc::AF_INET6);
    assert_eq!(call.hostent.h_length, 16);
    let mut loopback = vec![0u8; 16];
    loopback[15] = 1;
    assert_eq!(call.addresses(), vec![loopback]);

    let _ = fs::remove_file(path);
}

#[test]
fn missing_name_reports_not_found() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    let path = with_hosts_file(b"10.0.0.1 foo\n");

    let mut call = Call::new(1024);
    assert_eq!(call.by_name2("foo", libc::AF_INET6), NOTFOUND);
    assert_eq!(call.errno, ENOENT);
    assert_eq!(call.h_errno, HOST_NOT_FOUND);

    let _ = fs::remove_file(path);
}

#[test]
fn small_buffer_asks_for_retry_with_erange() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    let path = with_hosts_file(b"10.0.0.1 foo\n");

    let mut call = Call::new(8);
    assert_eq!(call.by_name2("foo", libc::AF_INET), TRYAGAIN);
    assert_eq!(call.errno, ERANGE);
    assert_eq!(call.h_errno, NETDB_INTERNAL);

    let mut call = Call::new(1024);
    assert_eq!(call.by_name2("foo", libc::AF_INET), SUCCESS);

    let _ = fs::remove_file(path);
}

#[test]
fn unset_hosts_file_is_soft_failure() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    // SAFETY: integration tests serialize env mutation via TEST_LOCK.
    unsafe { std::env::remove_var("HOSTS_FILE") };

    let mut call = Call::new(1024);
    assert_eq!(call.by_name("foo"), TRYAGAIN);
    assert_eq!(call.errno, EAGAIN);
    assert_eq!(call.h_errno, TRY_AGAIN);

    // SAFETY: integration tests serialize env mutation via TEST_LOCK.
    unsafe { std::env::set_var("HOSTS_FILE", "") };
    let mut call = Call::new(1024);
    assert_eq!(call.by_name("foo"), TRYAGAIN);
    assert_eq!(call.errno, EAGAIN);
}

#[test]
fn unsupported_family_is_unavailable() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    let path = with_hosts_file(b"10.0.0.1 foo\n");

    let mut call = Call::new(1024);
    assert_eq!(call.by_name2("foo", libc::AF_UNIX), UNAVAIL);
    assert_eq!(call.errno, EAFNOSUPPORT);
    assert_eq!(call.h_errno, NO_RECOVERY);

    let _ = fs::remove_file(path);
}

#[test]
fn null_arguments_are_rejected() {
    let mut call = Call::new(64);
    let rc = unsafe {
        _nss_envhosts_gethostbyname_r(
            ptr::null(),
            &mut call.hostent,
            call.buffer.as_mut_ptr(),
            call.buffer.len(),
            &mut call.errno,
            &mut call.h_errno,
        )
    };
    assert_eq!(rc, UNAVAIL);
    assert_eq!(call.errno, EINVAL);
}

#[test]
fn gethostbyaddr_returns_first_entry() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    let path = with_hosts_file(b"10.0.0.1 foo alias\n10.0.0.1 second\n");

    let mut call = Call::new(1024);
    assert_eq!(call.by_addr(&[10, 0, 0, 1], libc::AF_INET), SUCCESS);
    assert_eq!(call.name(), "foo");
    assert_eq!(call.aliases(), vec!["alias"]);

    let mut call = Call::new(1024);
    assert_eq!(call.by_addr(&[10, 0, 0], libc::AF_INET), NOTFOUND);

    let _ = fs::remove_file(path);
}

#[test]
fn enumeration_requires_an_open_session() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    let path = with_hosts_file(b"10.0.0.1 one\nbogus line\n10.0.0.2 two\n");

    _nss_envhosts_endhostent();
    let mut call = Call::new(1024);
    assert_eq!(call.next_env(), UNAVAIL);
    assert_eq!(call.errno, EBADF);

    assert_eq!(_nss_envhosts_sethostent(0), SUCCESS);
    let mut names = Vec::new();
    loop {
        let mut call = Call::new(1024);
        match call.next_env() {
            SUCCESS => names.push(call.name()),
            NOTFOUND => break,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(names, vec!["one", "two"]);

    assert_eq!(_nss_envhosts_endhostent(), SUCCESS);
    assert_eq!(_nss_envhosts_endhostent(), UNAVAIL);

    let _ = fs::remove_file(path);
}

#[test]
fn enumeration_retries_same_entry_after_erange() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    let path = with_hosts_file(b"10.0.0.1 a-fairly-long-host-name\n10.0.0.2 next\n");

    assert_eq!(_nss_envhosts_sethostent(1), SUCCESS);
    let mut small = Call::new(16);
    assert_eq!(small.next_env(), TRYAGAIN);
    assert_eq!(small.errno, ERANGE);

    let mut call = Call::new(1024);
    assert_eq!(call.next_env(), SUCCESS);
    assert_eq!(call.name(), "a-fairly-long-host-name");
    assert_eq!(_nss_envhosts_endhostent(), SUCCESS);

    let _ = fs::remove_file(path);
}

#[test]
fn sethostent_without_file_is_soft_failure() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    // SAFETY: integration tests serialize env mutation via TEST_LOCK.
    unsafe { std::env::set_var("HOSTS_FILE", temp_path("missing")) };

    assert_eq!(_nss_envhosts_sethostent(0), TRYAGAIN);
    assert_eq!(_nss_envhosts_endhostent(), UNAVAIL);
}

#[test]
fn homehosts_reads_dot_hosts_under_home() {
    let _guard = TEST_LOCK.lock().expect("lock should be available");
    let home = temp_path("home");
    fs::create_dir_all(&home).expect("temporary home should be creatable");
    write_file(&home.join(".hosts"), b"192.168.1.5 printer lp\n");
    let old_home = std::env::var_os("HOME");
    // SAFETY: integration tests serialize env mutation via TEST_LOCK.
    unsafe { std::env::set_var("HOME", &home) };

    let name = CString::new("lp").unwrap();
    let mut call = Call::new(512);
    let rc = unsafe {
        _nss_homehosts_gethostbyname_r(
            name.as_ptr(),
            &mut call.hostent,
            call.buffer.as_mut_ptr(),
            call.buffer.len(),
            &mut call.errno,
            &mut call.h_errno,
        )
    };
    assert_eq!(rc, SUCCESS);
    assert_eq!(call.name(), "printer");
    assert_eq!(call.addresses(), vec![vec![192, 168, 1, 5]]);

    assert_eq!(_nss_homehosts_sethostent(0), SUCCESS);
    let mut call = Call::new(512);
    assert_eq!(call.next_home(), SUCCESS);
    assert_eq!(call.aliases(), vec!["lp"]);
    let mut call = Call::new(512);
    assert_eq!(call.next_home(), NOTFOUND);
    assert_eq!(_nss_homehosts_endhostent(), SUCCESS);

    match old_home {
        // SAFETY: integration tests serialize env mutation via TEST_LOCK.
        Some(value) => unsafe { std::env::set_var("HOME", value) },
        None => unsafe { std::env::remove_var("HOME") },
    }
    let _ = fs::remove_dir_all(home);
}
