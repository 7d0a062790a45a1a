use std::fmt::Write;

use nsshosts_core::{AliasOrder, HostConf, HostRecord, LookupPolicy, NssStatus, Outcome, ProbeOrder};
use serde::Serialize;

use crate::HarnessError;
use crate::dump::hex_dump;

/// One record, rendered for humans and JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub name: String,
    pub family: &'static str,
    pub addresses: Vec<String>,
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump: Option<String>,
}

impl RecordView {
    pub fn new(record: &HostRecord<'_>, dump: bool) -> Self {
        let text = |b: &[u8]| String::from_utf8_lossy(b).into_owned();
        Self {
            name: text(record.name()),
            family: record.family().name(),
            addresses: record.host_addrs().map(|a| a.to_string()).collect(),
            aliases: record.aliases().map(text).collect(),
            dump: dump.then(|| hex_dump(record.as_bytes())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub status: &'static str,
    #[serde(skip)]
    pub nss_status: NssStatus,
    pub errno: i32,
    pub h_errno: i32,
    pub records: Vec<RecordView>,
}

impl Report {
    pub(crate) fn empty() -> Self {
        Self {
            status: status_name(NssStatus::NotFound),
            nss_status: NssStatus::NotFound,
            errno: 0,
            h_errno: 0,
            records: Vec::new(),
        }
    }

    pub(crate) fn single(outcome: &Outcome<'_>, dump: bool) -> Self {
        let mut report = Self::empty();
        report.set_status(outcome.status(), outcome.errno(), outcome.h_errno());
        if let Some(record) = outcome.record() {
            report.push(RecordView::new(record, dump));
        }
        report
    }

    pub(crate) fn push(&mut self, record: RecordView) {
        self.records.push(record);
    }

    pub(crate) fn set_status(&mut self, status: NssStatus, errno: i32, h_errno: i32) {
        self.status = status_name(status);
        self.nss_status = status;
        self.errno = errno;
        self.h_errno = h_errno;
    }

    /// Process exit code: 0 on success, 2 when nothing matched, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self.nss_status {
            NssStatus::Success => 0,
            NssStatus::NotFound => 2,
            NssStatus::TryAgain | NssStatus::Unavail => 1,
        }
    }

    pub fn to_json(&self) -> Result<String, HarnessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text rendering, one block per record.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if self.nss_status != NssStatus::Success {
            let _ = writeln!(
                out,
                "status: {} (errno {}, h_errno {})",
                self.status, self.errno, self.h_errno
            );
        }
        for record in &self.records {
            let _ = writeln!(out, "name:      {}", record.name);
            let _ = writeln!(out, "family:    {}", record.family);
            let _ = writeln!(out, "addresses: {}", record.addresses.join(" "));
            let _ = writeln!(out, "aliases:   {}", record.aliases.join(" "));
            if let Some(dump) = &record.dump {
                out.push_str(dump);
            }
        }
        out
    }
}

/// Parsed host.conf plus the policy the lookups run with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfView {
    pub multi: bool,
    pub reorder: bool,
    pub nospoof: bool,
    pub spoof: &'static str,
    pub trim: Vec<String>,
    pub order: Vec<String>,
    pub probe_order: &'static str,
    pub alias_order: &'static str,
}

impl ConfView {
    pub fn new(conf: &HostConf, policy: &LookupPolicy) -> Self {
        Self {
            multi: policy.multi,
            reorder: conf.reorder,
            nospoof: conf.nospoof,
            spoof: conf.spoof.name(),
            trim: conf.trim.clone(),
            order: conf.order.clone(),
            probe_order: match policy.probe_order {
                ProbeOrder::Inet4First => "inet,inet6",
                ProbeOrder::Inet6First => "inet6,inet",
            },
            alias_order: match policy.alias_order {
                AliasOrder::Stack => "stack",
                AliasOrder::Discovery => "discovery",
            },
        }
    }

    pub fn to_json(&self) -> Result<String, HarnessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_text(&self) -> String {
        let on = |flag: bool| if flag { "on" } else { "off" };
        let mut out = String::new();
        let _ = writeln!(out, "multi:       {}", on(self.multi));
        let _ = writeln!(out, "reorder:     {}", on(self.reorder));
        let _ = writeln!(out, "nospoof:     {}", on(self.nospoof));
        let _ = writeln!(out, "spoof:       {}", self.spoof);
        let _ = writeln!(out, "trim:        {}", self.trim.join(" "));
        let _ = writeln!(out, "order:       {}", self.order.join(" "));
        let _ = writeln!(out, "probe order: {}", self.probe_order);
        let _ = writeln!(out, "alias order: {}", self.alias_order);
        out
    }
}

pub fn status_name(status: NssStatus) -> &'static str {
    match status {
        NssStatus::Success => "success",
        NssStatus::NotFound => "notfound",
        NssStatus::TryAgain => "tryagain",
        NssStatus::Unavail => "unavail",
    }
}
