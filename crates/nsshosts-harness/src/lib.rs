//! Library side of the `nsshosts` command: runs one query against a hosts
//! file and turns the outcome into a printable report.

pub mod dump;
pub mod report;

use nsshosts_core::{Family, HostAddr, HostsDb, HostsSource, NssStatus, Outcome};
use thiserror::Error;
use tracing::debug;

pub use report::{ConfView, RecordView, Report};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("not an IPv4 or IPv6 address: {0}")]
    BadAddress(String),
    #[error("--file is required for lookups")]
    NoFile,
    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// One query shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Name {
        host: String,
        family: Option<Family>,
    },
    Addr(HostAddr),
    Enumerate,
}

impl Query {
    pub fn addr(literal: &str) -> Result<Self, HarnessError> {
        HostAddr::parse(literal.as_bytes())
            .map(Self::Addr)
            .ok_or_else(|| HarnessError::BadAddress(literal.to_string()))
    }
}

/// Runs `query` with a fresh `buflen`-byte buffer per call.
///
/// Enumeration reads entries until the session runs out; running out is
/// reported as success when at least one entry was read.
pub fn run<S: HostsSource>(db: &HostsDb<S>, query: &Query, buflen: usize, dump: bool) -> Report {
    let mut buf = vec![0u8; buflen];
    match query {
        Query::Name { host, family } => {
            let outcome = match family {
                Some(family) => db.lookup_by_name_and_family(host.as_bytes(), family.af(), &mut buf),
                None => db.lookup_by_name(host.as_bytes(), &mut buf),
            };
            Report::single(&outcome, dump)
        }
        Query::Addr(addr) => {
            let bytes = addr.as_bytes();
            let outcome =
                db.lookup_by_address(bytes, bytes.len(), addr.family().af(), &mut buf);
            Report::single(&outcome, dump)
        }
        Query::Enumerate => enumerate(db, &mut buf, dump),
    }
}

fn enumerate<S: HostsSource>(db: &HostsDb<S>, buf: &mut [u8], dump: bool) -> Report {
    let mut session = match db.open() {
        Ok(session) => session,
        Err(outcome) => return Report::single(&outcome, dump),
    };

    let mut report = Report::empty();
    loop {
        let outcome = db.next(Some(&mut session), &mut *buf);
        match outcome {
            Outcome::Success(record) => report.push(RecordView::new(&record, dump)),
            Outcome::NotFound if !report.records.is_empty() => {
                report.set_status(NssStatus::Success, 0, 0);
                break;
            }
            other => {
                report.set_status(other.status(), other.errno(), other.h_errno());
                break;
            }
        }
    }
    debug!(entries = report.records.len(), "enumeration finished");
    db.close(session);
    report
}
