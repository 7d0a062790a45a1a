//! Entry matching over a scanned hosts stream.
//!
//! The engine pulls tokens from a [`Scanner`] and streams whatever matches
//! into a [`RecordPacker`]. A name query reads each candidate line twice:
//! pass 1 looks for the name, pass 2 re-enters the line at its first host
//! name and hands every name to the packer.

use std::io::{BufRead, Seek};

use tracing::trace;

use crate::arena::RecordPacker;
use crate::error::LookupError;
use crate::inet::{Family, HostAddr};
use crate::scanner::{MAX_ADDR_TOKEN, MAX_NAME_TOKEN, Scan, Scanner};

/// What the address column of one line produced.
enum Line {
    Eof,
    /// Comment, blank remainder or malformed address; the line is consumed.
    Skip,
    /// A valid address; `eol` is set when no host names follow it.
    Entry { addr: HostAddr, eol: bool },
}

pub struct MatchEngine<'s, R> {
    scanner: &'s mut Scanner<R>,
}

impl<'s, R: BufRead + Seek> MatchEngine<'s, R> {
    pub fn new(scanner: &'s mut Scanner<R>) -> Self {
        Self { scanner }
    }

    /// Collects entries listing `name` as one of their host names.
    ///
    /// With `family` unset the first matching entry fixes the family and
    /// later entries of the other family are passed over. Without `multi`
    /// the scan stops at the first match.
    pub fn by_name(
        &mut self,
        packer: &mut RecordPacker<'_>,
        name: &[u8],
        family: Option<Family>,
        multi: bool,
    ) -> Result<(), LookupError> {
        let mut filter = family;
        loop {
            let (addr, eol) = match self.read_address()? {
                Line::Eof => break,
                Line::Skip => continue,
                Line::Entry { addr, eol } => (addr, eol),
            };
            if filter.is_some_and(|f| f != addr.family()) {
                if !eol {
                    self.scanner.skip_line()?;
                }
                continue;
            }
            if eol {
                continue;
            }

            let names_at = self.scanner.position();
            if !self.line_has_name(name)? {
                continue;
            }

            trace!(%addr, offset = names_at, "name matched");
            self.scanner.seek_to(names_at)?;
            self.collect_names(packer)?;
            packer.push_address(&addr)?;
            filter = Some(addr.family());

            if !multi {
                break;
            }
        }

        if packer.address_count() == 0 {
            return Err(LookupError::NotFound);
        }
        Ok(())
    }

    /// Finds the first entry whose address equals `addr`.
    pub fn by_address(
        &mut self,
        packer: &mut RecordPacker<'_>,
        addr: &HostAddr,
    ) -> Result<(), LookupError> {
        loop {
            match self.read_address()? {
                Line::Eof => return Err(LookupError::NotFound),
                Line::Skip => {}
                Line::Entry { addr: found, eol } if found == *addr => {
                    trace!(%found, "address matched");
                    return self.fill_entry(packer, &found, eol);
                }
                Line::Entry { eol, .. } => {
                    if !eol {
                        self.scanner.skip_line()?;
                    }
                }
            }
        }
    }

    /// Packs the next valid entry of the stream.
    ///
    /// On failure the scanner is left at the start of that entry so a retry
    /// with a larger buffer returns it again.
    pub fn next_entry(&mut self, packer: &mut RecordPacker<'_>) -> Result<(), LookupError> {
        loop {
            let start = self.scanner.position();
            let (addr, eol) = match self.read_address()? {
                Line::Eof => return Err(LookupError::NotFound),
                Line::Skip => continue,
                Line::Entry { addr, eol } => (addr, eol),
            };
            if let Err(err) = self.fill_entry(packer, &addr, eol) {
                trace!(offset = start, %err, "rewinding entry");
                self.scanner.seek_to(start)?;
                return Err(err);
            }
            return Ok(());
        }
    }

    fn read_address(&mut self) -> Result<Line, LookupError> {
        let (addr, eol) = match self.scanner.next_token(MAX_ADDR_TOKEN)? {
            Scan::Eof => return Ok(Line::Eof),
            Scan::Comment => return Ok(Line::Skip),
            Scan::Token(token) => (HostAddr::parse(token.text), token.eol),
        };
        match addr {
            Some(addr) => Ok(Line::Entry { addr, eol }),
            None => {
                if !eol {
                    self.scanner.skip_line()?;
                }
                Ok(Line::Skip)
            }
        }
    }

    /// Pass 1: reads host names up to the end of the line, stopping early at
    /// a case-insensitive match.
    fn line_has_name(&mut self, name: &[u8]) -> Result<bool, LookupError> {
        loop {
            match self.scanner.next_token(MAX_NAME_TOKEN)? {
                Scan::Eof | Scan::Comment => return Ok(false),
                Scan::Token(token) => {
                    if token.text.eq_ignore_ascii_case(name) {
                        return Ok(true);
                    }
                    if token.eol {
                        return Ok(false);
                    }
                }
            }
        }
    }

    fn fill_entry(
        &mut self,
        packer: &mut RecordPacker<'_>,
        addr: &HostAddr,
        eol: bool,
    ) -> Result<(), LookupError> {
        if !eol {
            self.collect_names(packer)?;
        }
        packer.push_address(addr)?;
        Ok(())
    }

    /// Pass 2: the first name of the entry that names the record becomes
    /// canonical, every other name becomes an alias. Entries merged in later
    /// do not repeat the canonical name as an alias.
    fn collect_names(&mut self, packer: &mut RecordPacker<'_>) -> Result<(), LookupError> {
        let naming = !packer.has_name();
        let mut first = true;
        loop {
            let token = match self.scanner.next_token(MAX_NAME_TOKEN)? {
                Scan::Eof | Scan::Comment => return Ok(()),
                Scan::Token(token) => token,
            };
            if naming && first {
                packer.set_name(token.text)?;
            } else if naming || !packer.is_canonical(token.text) {
                packer.push_alias(token.text)?;
            }
            first = false;
            if token.eol {
                return Ok(());
            }
        }
    }
}
