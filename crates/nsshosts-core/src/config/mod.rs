//! /etc/host.conf parser and the lookup policy derived from it.
//!
//! Only `multi` changes how hosts files are searched; the other keywords are
//! parsed so a real host.conf round-trips without surprises.
//!
//! # Supported Keywords
//!
//! - `multi on|off`: return every matching entry instead of the first
//! - `reorder on|off`
//! - `trim <domain>...`
//! - `nospoof on|off`
//! - `spoof off|nowarn|warn`
//! - `order <service>...`
//!
//! Tokens may be separated by blanks, commas, semicolons or colons. Unknown
//! keywords are ignored.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use crate::arena::AliasOrder;
use crate::inet::Family;

// ---------------------------------------------------------------------------
// Locations and overrides
// ---------------------------------------------------------------------------

pub const HOST_CONF_PATH: &str = "/etc/host.conf";

/// Alternate host.conf location.
pub const RESOLV_HOST_CONF: &str = "RESOLV_HOST_CONF";

/// `on`/`off`, overrides the `multi` keyword.
pub const RESOLV_MULTI: &str = "RESOLV_MULTI";

// ---------------------------------------------------------------------------
// host.conf
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpoofMode {
    #[default]
    Off,
    NoWarn,
    Warn,
}

impl SpoofMode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::NoWarn => "nowarn",
            Self::Warn => "warn",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostConf {
    pub multi: bool,
    pub reorder: bool,
    pub nospoof: bool,
    pub spoof: SpoofMode,
    /// Domains stripped from names returned by DNS.
    pub trim: Vec<String>,
    /// Service order (`bind`, `hosts`, `nis`).
    pub order: Vec<String>,
}

impl HostConf {
    /// Parse configuration from host.conf content.
    pub fn parse(content: &[u8]) -> Self {
        let mut conf = Self::default();
        for line in content.split(|&b| b == b'\n') {
            conf.parse_line(line);
        }
        conf
    }

    /// Reads `$RESOLV_HOST_CONF` (or `/etc/host.conf`) and applies the
    /// environment overrides. A missing file yields the defaults.
    pub fn load() -> Self {
        let path = env::var_os(RESOLV_HOST_CONF)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(HOST_CONF_PATH));

        let mut conf = match fs::read(&path) {
            Ok(content) => Self::parse(&content),
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    debug!(path = %path.display(), %err, "host.conf unreadable, using defaults");
                }
                Self::default()
            }
        };
        conf.apply_overrides(|key| env::var_os(key));
        conf
    }

    /// Applies `RESOLV_*` overrides fetched through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<OsString>) {
        if let Some(value) = lookup(RESOLV_MULTI)
            && let Some(on) = parse_switch(value.as_encoded_bytes())
        {
            self.multi = on;
        }
    }

    fn parse_line(&mut self, line: &[u8]) {
        let line = match line.iter().position(|&b| b == b'#') {
            Some(hash) => &line[..hash],
            None => line,
        };
        let mut words = line
            .split(|&b| matches!(b, b' ' | b'\t' | b'\r' | b',' | b';' | b':'))
            .filter(|w| !w.is_empty());

        let Some(keyword) = words.next() else {
            return;
        };
        let keyword = keyword.to_ascii_lowercase();

        match keyword.as_slice() {
            b"multi" => {
                if let Some(on) = words.next().and_then(parse_switch) {
                    self.multi = on;
                }
            }
            b"reorder" => {
                if let Some(on) = words.next().and_then(parse_switch) {
                    self.reorder = on;
                }
            }
            b"nospoof" => {
                if let Some(on) = words.next().and_then(parse_switch) {
                    self.nospoof = on;
                }
            }
            b"spoof" => {
                if let Some(mode) = words.next().and_then(parse_spoof) {
                    self.spoof = mode;
                }
            }
            b"trim" => {
                self.trim
                    .extend(words.map(|w| String::from_utf8_lossy(w).into_owned()));
            }
            b"order" => {
                self.order = words
                    .map(|w| String::from_utf8_lossy(w).to_ascii_lowercase())
                    .collect();
            }
            _ => {}
        }
    }
}

fn parse_switch(word: &[u8]) -> Option<bool> {
    if word.eq_ignore_ascii_case(b"on") {
        Some(true)
    } else if word.eq_ignore_ascii_case(b"off") {
        Some(false)
    } else {
        None
    }
}

fn parse_spoof(word: &[u8]) -> Option<SpoofMode> {
    match word.to_ascii_lowercase().as_slice() {
        b"off" => Some(SpoofMode::Off),
        b"nowarn" => Some(SpoofMode::NoWarn),
        b"warn" => Some(SpoofMode::Warn),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Lookup policy
// ---------------------------------------------------------------------------

/// Family tried first when a name query does not name one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeOrder {
    #[default]
    Inet4First,
    Inet6First,
}

impl ProbeOrder {
    pub const fn families(self) -> [Family; 2] {
        match self {
            Self::Inet4First => [Family::Inet, Family::Inet6],
            Self::Inet6First => [Family::Inet6, Family::Inet],
        }
    }
}

/// Knobs a [`crate::HostsDb`] runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupPolicy {
    pub multi: bool,
    pub probe_order: ProbeOrder,
    pub alias_order: AliasOrder,
}

impl LookupPolicy {
    pub fn from_host_conf(conf: &HostConf) -> Self {
        Self {
            multi: conf.multi,
            ..Self::default()
        }
    }

    pub fn with_multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    pub fn with_probe_order(mut self, order: ProbeOrder) -> Self {
        self.probe_order = order;
        self
    }

    pub fn with_alias_order(mut self, order: AliasOrder) -> Self {
        self.alias_order = order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert_eq!(HostConf::parse(b""), HostConf::default());
        assert!(!HostConf::default().multi);
    }

    #[test]
    fn test_parse_multi() {
        assert!(HostConf::parse(b"multi on\n").multi);
        assert!(HostConf::parse(b"MULTI On\n").multi);
        assert!(!HostConf::parse(b"multi on\nmulti off\n").multi);
        assert!(!HostConf::parse(b"multi maybe\n").multi);
    }

    #[test]
    fn test_parse_typical_file() {
        let conf = HostConf::parse(
            b"# The \"order\" line is only used by old versions of the C library.\n\
              order hosts,bind\n\
              multi on\n\
              reorder on\n\
              nospoof on\n\
              spoof warn\n\
              trim example.com;example.net\n",
        );
        assert!(conf.multi);
        assert!(conf.reorder);
        assert!(conf.nospoof);
        assert_eq!(conf.spoof, SpoofMode::Warn);
        assert_eq!(conf.order, vec!["hosts", "bind"]);
        assert_eq!(conf.trim, vec!["example.com", "example.net"]);
    }

    #[test]
    fn test_parse_comments_and_unknown_keywords() {
        let conf = HostConf::parse(b"multi on # trailing\nfrobnicate yes\n# multi off\n");
        assert!(conf.multi);
        assert_eq!(conf, HostConf { multi: true, ..HostConf::default() });
    }

    #[test]
    fn test_override_multi() {
        let mut conf = HostConf::parse(b"multi off\n");
        conf.apply_overrides(|key| (key == RESOLV_MULTI).then(|| OsString::from("on")));
        assert!(conf.multi);

        conf.apply_overrides(|key| (key == RESOLV_MULTI).then(|| OsString::from("bogus")));
        assert!(conf.multi);

        conf.apply_overrides(|_| None);
        assert!(conf.multi);
    }

    #[test]
    fn test_policy_from_conf() {
        let conf = HostConf::parse(b"multi on\n");
        let policy = LookupPolicy::from_host_conf(&conf);
        assert!(policy.multi);
        assert_eq!(policy.probe_order, ProbeOrder::Inet4First);
        assert_eq!(policy.alias_order, AliasOrder::Stack);
    }

    #[test]
    fn test_probe_order_families() {
        assert_eq!(
            ProbeOrder::Inet4First.families(),
            [Family::Inet, Family::Inet6]
        );
        assert_eq!(
            ProbeOrder::Inet6First.families(),
            [Family::Inet6, Family::Inet]
        );
    }
}
