//! Address families and literal parsing for hosts-file entries.
//!
//! A hosts line starts with an IPv4 dotted quad or an IPv6 colon-hex literal.
//! [`HostAddr::parse`] tries the IPv4 grammar first and falls back to IPv6,
//! which is the order `inet_pton` is probed in by classic NSS file backends.

use core::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// `AF_INET` on Linux.
pub const AF_INET: i32 = 2;
/// `AF_INET6` on Linux.
pub const AF_INET6: i32 = 10;

/// Longest textual IPv6 address plus its NUL (`INET6_ADDRSTRLEN`).
pub const INET6_ADDRSTRLEN: usize = 46;

/// Address family of a hosts entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Inet,
    Inet6,
}

impl Family {
    /// Maps a raw `AF_*` value. Anything other than IPv4/IPv6 is unsupported.
    pub const fn from_af(af: i32) -> Option<Self> {
        match af {
            AF_INET => Some(Self::Inet),
            AF_INET6 => Some(Self::Inet6),
            _ => None,
        }
    }

    #[inline]
    pub const fn af(self) -> i32 {
        match self {
            Self::Inet => AF_INET,
            Self::Inet6 => AF_INET6,
        }
    }

    /// Width of one binary address (`h_length`).
    #[inline]
    pub const fn addr_len(self) -> usize {
        match self {
            Self::Inet => 4,
            Self::Inet6 => 16,
        }
    }

    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Self::Inet => Self::Inet6,
            Self::Inet6 => Self::Inet,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Inet => "inet",
            Self::Inet6 => "inet6",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A binary host address in network byte order.
///
/// The family and the byte width travel together, so a record can never carry
/// a 16-byte address tagged as IPv4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostAddr {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl HostAddr {
    /// Parses one address token. Returns `None` for anything that is neither
    /// an IPv4 nor an IPv6 literal.
    pub fn parse(token: &[u8]) -> Option<Self> {
        let text = core::str::from_utf8(token).ok()?;
        if let Ok(v4) = text.parse::<Ipv4Addr>() {
            return Some(Self::V4(v4.octets()));
        }
        text.parse::<Ipv6Addr>().ok().map(|v6| Self::V6(v6.octets()))
    }

    /// Builds an address from raw bytes of the given family.
    ///
    /// `bytes` must be exactly [`Family::addr_len`] long.
    pub fn from_bytes(family: Family, bytes: &[u8]) -> Option<Self> {
        match family {
            Family::Inet => <[u8; 4]>::try_from(bytes).ok().map(Self::V4),
            Family::Inet6 => <[u8; 16]>::try_from(bytes).ok().map(Self::V6),
        }
    }

    #[inline]
    pub const fn family(&self) -> Family {
        match self {
            Self::V4(_) => Family::Inet,
            Self::V6(_) => Family::Inet6,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::V4(octets) => octets.as_slice(),
            Self::V6(octets) => octets.as_slice(),
        }
    }
}

impl fmt::Display for HostAddr {
    /// Dotted quad for IPv4, RFC 5952 text for IPv6.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(octets) => fmt::Display::fmt(&Ipv4Addr::from(*octets), f),
            Self::V6(octets) => fmt::Display::fmt(&Ipv6Addr::from(*octets), f),
        }
    }
}

impl From<std::net::IpAddr> for HostAddr {
    fn from(ip: std::net::IpAddr) -> Self {
        match ip {
            std::net::IpAddr::V4(v4) => Self::V4(v4.octets()),
            std::net::IpAddr::V6(v6) => Self::V6(v6.octets()),
        }
    }
}
