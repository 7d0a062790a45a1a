//! Query driver: turns one lookup into one [`Outcome`].
//!
//! Each query opens a fresh stream from the [`HostsSource`], runs the match
//! engine into a [`RecordPacker`] over the caller's buffer and folds every
//! failure into the NSS status triple. Enumeration is the only stateful path
//! and its state lives in an explicit [`HostsSession`].

use std::io::{BufRead, Seek};

use tracing::debug;

use crate::arena::{HostRecord, RecordLayout, RecordPacker};
use crate::config::LookupPolicy;
use crate::engine::MatchEngine;
use crate::error::LookupError;
use crate::inet::{Family, HostAddr};
use crate::scanner::Scanner;
use crate::source::HostsSource;
use crate::status::{
    EAFNOSUPPORT, EAGAIN, EBADF, ENOENT, ERANGE, HOST_NOT_FOUND, NETDB_INTERNAL, NETDB_SUCCESS,
    NO_RECOVERY, NssStatus, TRY_AGAIN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    UnsupportedFamily,
    NoSession,
}

/// Result of one query. A successful record borrows the caller's buffer.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    Success(HostRecord<'a>),
    NotFound,
    /// The hosts stream could not be opened or read.
    TryAgainSoft,
    /// The record did not fit; retry with a larger buffer.
    TryAgainBufferTooSmall,
    Unavailable(UnavailableReason),
}

impl<'a> Outcome<'a> {
    /// Pairs a packer result with the buffer it was packed into.
    pub fn from_packed(result: Result<RecordLayout, LookupError>, buf: &'a [u8]) -> Self {
        match result {
            Ok(layout) => Self::Success(HostRecord::new(buf, layout)),
            Err(err) => err.into(),
        }
    }

    pub fn status(&self) -> NssStatus {
        match self {
            Self::Success(_) => NssStatus::Success,
            Self::NotFound => NssStatus::NotFound,
            Self::TryAgainSoft | Self::TryAgainBufferTooSmall => NssStatus::TryAgain,
            Self::Unavailable(_) => NssStatus::Unavail,
        }
    }

    /// Value for `*errnop`.
    pub fn errno(&self) -> i32 {
        match self {
            Self::Success(_) => 0,
            Self::NotFound => ENOENT,
            Self::TryAgainSoft => EAGAIN,
            Self::TryAgainBufferTooSmall => ERANGE,
            Self::Unavailable(UnavailableReason::UnsupportedFamily) => EAFNOSUPPORT,
            Self::Unavailable(UnavailableReason::NoSession) => EBADF,
        }
    }

    /// Value for `*h_errnop`.
    pub fn h_errno(&self) -> i32 {
        match self {
            Self::Success(_) => NETDB_SUCCESS,
            Self::NotFound => HOST_NOT_FOUND,
            Self::TryAgainSoft => TRY_AGAIN,
            Self::TryAgainBufferTooSmall => NETDB_INTERNAL,
            Self::Unavailable(_) => NO_RECOVERY,
        }
    }

    pub fn record(&self) -> Option<&HostRecord<'a>> {
        match self {
            Self::Success(record) => Some(record),
            _ => None,
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<LookupError> for Outcome<'_> {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound => Self::NotFound,
            LookupError::Source(_) | LookupError::Read(_) => Self::TryAgainSoft,
            ref e if e.is_too_small() => Self::TryAgainBufferTooSmall,
            LookupError::Arena(_) => Self::NotFound,
            LookupError::UnsupportedFamily(_) => {
                Self::Unavailable(UnavailableReason::UnsupportedFamily)
            }
            LookupError::NoSession => Self::Unavailable(UnavailableReason::NoSession),
        }
    }
}

/// Open enumeration state: a stream and how far it has been read.
pub struct HostsSession<R> {
    scanner: Scanner<R>,
}

impl<R: BufRead + Seek> HostsSession<R> {
    pub fn new(reader: R) -> Self {
        Self {
            scanner: Scanner::new(reader),
        }
    }

    /// Byte offset of the next entry to be read.
    pub fn position(&self) -> u64 {
        self.scanner.position()
    }
}

/// A hosts database: one source plus the policy its queries run with.
#[derive(Debug, Clone)]
pub struct HostsDb<S> {
    source: S,
    policy: LookupPolicy,
}

impl<S: HostsSource> HostsDb<S> {
    pub fn new(source: S, policy: LookupPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> &LookupPolicy {
        &self.policy
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Looks `name` up in both families, in the configured probe order.
    /// The second family is only tried when the first finds nothing.
    pub fn lookup_by_name<'b>(&self, name: &[u8], buf: &'b mut [u8]) -> Outcome<'b> {
        for family in self.policy.probe_order.families() {
            match self.run_by_name(name, family, &mut *buf) {
                Err(LookupError::NotFound) => continue,
                result => return Outcome::from_packed(result, buf),
            }
        }
        debug!(name = %String::from_utf8_lossy(name), "name not found in any family");
        Outcome::NotFound
    }

    pub fn lookup_by_name_and_family<'b>(
        &self,
        name: &[u8],
        af: i32,
        buf: &'b mut [u8],
    ) -> Outcome<'b> {
        let Some(family) = Family::from_af(af) else {
            debug!(af, "unsupported address family");
            return LookupError::UnsupportedFamily(af).into();
        };
        let result = self.run_by_name(name, family, &mut *buf);
        Outcome::from_packed(result, buf)
    }

    /// Reverse lookup of a binary address. `len` must equal the family's
    /// address width or nothing matches.
    pub fn lookup_by_address<'b>(
        &self,
        addr: &[u8],
        len: usize,
        af: i32,
        buf: &'b mut [u8],
    ) -> Outcome<'b> {
        let Some(family) = Family::from_af(af) else {
            debug!(af, "unsupported address family");
            return LookupError::UnsupportedFamily(af).into();
        };
        let target = match addr.get(..len) {
            Some(bytes) if len == family.addr_len() => HostAddr::from_bytes(family, bytes),
            _ => None,
        };
        let Some(target) = target else {
            debug!(len, %family, "address length does not match family");
            return Outcome::NotFound;
        };

        let result = self.run(&mut *buf, |engine, packer| engine.by_address(packer, &target));
        debug!(addr = %target, ok = result.is_ok(), "lookup by address");
        Outcome::from_packed(result, buf)
    }

    /// Opens an enumeration session at the first entry.
    pub fn open(&self) -> Result<HostsSession<S::Reader>, Outcome<'static>> {
        match self.source.open() {
            Ok(reader) => Ok(HostsSession::new(reader)),
            Err(err) => {
                debug!(%err, "cannot open hosts source");
                Err(LookupError::from(err).into())
            }
        }
    }

    /// Returns the next entry of an open session.
    ///
    /// Without a session this is [`UnavailableReason::NoSession`]. A record
    /// that does not fit leaves the session on that entry.
    pub fn next<'b, R: BufRead + Seek>(
        &self,
        session: Option<&mut HostsSession<R>>,
        buf: &'b mut [u8],
    ) -> Outcome<'b> {
        let Some(session) = session else {
            return LookupError::NoSession.into();
        };
        let result = {
            let mut packer = RecordPacker::new(&mut *buf, self.policy.alias_order);
            MatchEngine::new(&mut session.scanner)
                .next_entry(&mut packer)
                .and_then(|()| packer.finish().map_err(LookupError::from))
        };
        Outcome::from_packed(result, buf)
    }

    /// Releases a session. Dropping it has the same effect.
    pub fn close(&self, session: HostsSession<S::Reader>) {
        debug!(position = session.position(), "closing hosts session");
        drop(session);
    }

    fn run_by_name(
        &self,
        name: &[u8],
        family: Family,
        buf: &mut [u8],
    ) -> Result<RecordLayout, LookupError> {
        let multi = self.policy.multi;
        let result = self.run(buf, |engine, packer| {
            engine.by_name(packer, name, Some(family), multi)
        });
        debug!(
            name = %String::from_utf8_lossy(name),
            %family,
            multi,
            ok = result.is_ok(),
            "lookup by name"
        );
        result
    }

    /// Opens the source and runs one engine query into `buf`.
    fn run<F>(&self, buf: &mut [u8], query: F) -> Result<RecordLayout, LookupError>
    where
        F: FnOnce(
            &mut MatchEngine<'_, S::Reader>,
            &mut RecordPacker<'_>,
        ) -> Result<(), LookupError>,
    {
        let mut scanner = Scanner::new(self.source.open()?);
        let mut packer = RecordPacker::new(buf, self.policy.alias_order);
        query(&mut MatchEngine::new(&mut scanner), &mut packer)?;
        Ok(packer.finish()?)
    }
}
