//! Dual-direction bump allocator that packs a host record into one buffer.
//!
//! The layout is the one `struct hostent` consumers expect from a reentrant
//! NSS backend, with every pointer pointing back into the same buffer:
//!
//! ```text
//! 0                                                                      C
//! | name\0 |pad| addr0 addr1 .. |pad| &addr0 &addr1 .. 0 | &al .. 0 |free| aliasN\0 .. alias1\0 |
//! ^ head grows ->                                                       <- tail grows ^
//! ```
//!
//! Alias strings are pushed below `tail` as they are discovered, so the last
//! one found sits lowest. Pointer tables are filled in [`RecordPacker::finish`]
//! only; everything before that works in byte offsets. Every reservation checks
//! that the head region, including the pointer tables still to come, stays at
//! or below `tail`, and fails before writing anything when it would not.

use core::mem::size_of;

use thiserror::Error;
use tracing::trace;

use crate::inet::{Family, HostAddr};

/// Width and alignment of one pointer slot.
pub const WORD: usize = size_of::<usize>();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The record does not fit; the caller should retry with a larger buffer.
    #[error("buffer too small: record needs at least {required} bytes, have {capacity}")]
    TooSmall { required: usize, capacity: usize },
    #[error("cannot mix {found} address into {expected} record")]
    MixedFamily { expected: Family, found: Family },
    #[error("record has no address")]
    Empty,
}

/// Order in which aliases appear in the finished alias table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AliasOrder {
    /// Walk the tail stack from its lowest address upward: the alias found
    /// last comes first. Byte-compatible with the classic C backends.
    #[default]
    Stack,
    /// Aliases in the order they were found in the file.
    Discovery,
}

/// Where a finished record lives inside its buffer.
///
/// Holds offsets only, so it can outlive the mutable borrow used to build it
/// and be turned back into a [`HostRecord`] over the same buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    /// Address of byte 0 of the buffer when the pointer tables were written.
    pub base: usize,
    pub name: usize,
    pub family: Family,
    pub addr_list: usize,
    pub addr_count: usize,
    pub aliases: usize,
    pub alias_count: usize,
    /// First byte past the head region.
    pub head_end: usize,
    /// First byte of the tail region (`capacity` when there are no aliases).
    pub tail_start: usize,
}

/// Streams a matched result into a caller buffer.
///
/// Call order: [`set_name`](Self::set_name) (optional, first one wins), then
/// any mix of [`push_address`](Self::push_address) and
/// [`push_alias`](Self::push_alias), then [`finish`](Self::finish).
pub struct RecordPacker<'a> {
    buf: &'a mut [u8],
    base: usize,
    head: usize,
    tail: usize,
    name: Option<usize>,
    family: Option<Family>,
    addr_start: usize,
    addr_count: usize,
    alias_count: usize,
    order: AliasOrder,
}

impl<'a> RecordPacker<'a> {
    pub fn new(buf: &'a mut [u8], order: AliasOrder) -> Self {
        let base = buf.as_ptr() as usize;
        let tail = buf.len();
        Self {
            buf,
            base,
            head: 0,
            tail,
            name: None,
            family: None,
            addr_start: 0,
            addr_count: 0,
            alias_count: 0,
            order,
        }
    }

    #[inline]
    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    #[inline]
    pub fn address_count(&self) -> usize {
        self.addr_count
    }

    #[inline]
    pub fn alias_count(&self) -> usize {
        self.alias_count
    }

    #[inline]
    pub fn family(&self) -> Option<Family> {
        self.family
    }

    /// The canonical name written so far (without its NUL).
    pub fn name(&self) -> Option<&[u8]> {
        self.name.map(|off| cstr_at(self.buf, off))
    }

    /// True when `candidate` equals the canonical name, ignoring ASCII case.
    pub fn is_canonical(&self, candidate: &[u8]) -> bool {
        self.name()
            .is_some_and(|name| name.eq_ignore_ascii_case(candidate))
    }

    /// Writes the canonical name at the bottom of the buffer.
    ///
    /// Only the first call has an effect; later calls are ignored so a
    /// multi-entry result keeps the name of its first entry.
    pub fn set_name(&mut self, name: &[u8]) -> Result<(), ArenaError> {
        if self.name.is_some() {
            return Ok(());
        }
        debug_assert_eq!(self.addr_count, 0, "addresses must follow the name");

        let start = self.head;
        let after = self.align(start + name.len() + 1);
        self.ensure(after, self.addr_count, self.alias_count, self.tail)?;

        self.buf[start..start + name.len()].copy_from_slice(name);
        self.buf[start + name.len()] = 0;
        self.name = Some(start);
        self.head = after;
        self.addr_start = after;
        trace!(offset = start, len = name.len(), "packed canonical name");
        Ok(())
    }

    /// Appends one binary address to the contiguous address run.
    ///
    /// The first address fixes the record family. An unnamed record gets an
    /// empty canonical name first.
    pub fn push_address(&mut self, addr: &HostAddr) -> Result<(), ArenaError> {
        let family = addr.family();
        if let Some(expected) = self.family
            && expected != family
        {
            return Err(ArenaError::MixedFamily {
                expected,
                found: family,
            });
        }
        if self.name.is_none() {
            self.set_name(b"")?;
        }

        let slot = self.head;
        let bytes = addr.as_bytes();
        self.ensure(
            slot + bytes.len(),
            self.addr_count + 1,
            self.alias_count,
            self.tail,
        )?;

        self.buf[slot..slot + bytes.len()].copy_from_slice(bytes);
        self.head = slot + bytes.len();
        self.addr_count += 1;
        self.family = Some(family);
        trace!(offset = slot, count = self.addr_count, "packed address");
        Ok(())
    }

    /// Pushes one alias string just below the tail cursor. The alias ends at
    /// its first NUL byte, if it has one.
    pub fn push_alias(&mut self, alias: &[u8]) -> Result<(), ArenaError> {
        let alias = alias
            .iter()
            .position(|&b| b == 0)
            .map_or(alias, |nul| &alias[..nul]);
        let size = alias.len() + 1;
        let Some(new_tail) = self.tail.checked_sub(size) else {
            let tail_bytes = self.buf.len() - self.tail + size;
            return Err(self.too_small(
                self.head,
                self.addr_count,
                self.alias_count + 1,
                tail_bytes,
            ));
        };
        self.ensure(self.head, self.addr_count, self.alias_count + 1, new_tail)?;

        self.buf[new_tail..new_tail + alias.len()].copy_from_slice(alias);
        self.buf[new_tail + alias.len()] = 0;
        self.tail = new_tail;
        self.alias_count += 1;
        trace!(offset = new_tail, count = self.alias_count, "packed alias");
        Ok(())
    }

    /// Writes both pointer tables and returns the record layout.
    pub fn finish(mut self) -> Result<RecordLayout, ArenaError> {
        let Some(family) = self.family else {
            return Err(ArenaError::Empty);
        };
        let Some(name) = self.name else {
            return Err(ArenaError::Empty);
        };

        let addr_len = family.addr_len();
        let addr_list = self.align(self.head);
        let aliases = addr_list + (self.addr_count + 1) * WORD;
        let head_end = aliases + (self.alias_count + 1) * WORD;
        self.ensure(self.head, self.addr_count, self.alias_count, self.tail)?;

        for i in 0..self.addr_count {
            let target = self.base + self.addr_start + i * addr_len;
            self.write_word(addr_list + i * WORD, target);
        }
        self.write_word(addr_list + self.addr_count * WORD, 0);

        // The alias strings sit back to back from `tail` up to the end of the
        // buffer, most recently pushed first.
        let mut cursor = self.tail;
        for i in 0..self.alias_count {
            let len = cstr_at(self.buf, cursor).len();
            let slot = match self.order {
                AliasOrder::Stack => i,
                AliasOrder::Discovery => self.alias_count - 1 - i,
            };
            self.write_word(aliases + slot * WORD, self.base + cursor);
            cursor += len + 1;
        }
        self.write_word(aliases + self.alias_count * WORD, 0);

        Ok(RecordLayout {
            base: self.base,
            name,
            family,
            addr_list,
            addr_count: self.addr_count,
            aliases,
            alias_count: self.alias_count,
            head_end,
            tail_start: self.tail,
        })
    }

    /// Rounds `offset` up so that `base + offset` is pointer-aligned.
    #[inline]
    fn align(&self, offset: usize) -> usize {
        let addr = self.base + offset;
        addr.next_multiple_of(WORD) - self.base
    }

    /// Checks that a head region ending at `head`, followed by both pointer
    /// tables sized for the given counts, still fits below `tail`.
    fn ensure(
        &self,
        head: usize,
        addr_count: usize,
        alias_count: usize,
        tail: usize,
    ) -> Result<(), ArenaError> {
        let end = self.align(head) + (addr_count + alias_count + 2) * WORD;
        if end > tail {
            return Err(self.too_small(head, addr_count, alias_count, self.buf.len() - tail));
        }
        Ok(())
    }

    fn too_small(
        &self,
        head: usize,
        addr_count: usize,
        alias_count: usize,
        tail_bytes: usize,
    ) -> ArenaError {
        let head_bytes = self.align(head) + (addr_count + alias_count + 2) * WORD;
        ArenaError::TooSmall {
            required: head_bytes + tail_bytes,
            capacity: self.buf.len(),
        }
    }

    #[inline]
    fn write_word(&mut self, offset: usize, value: usize) {
        self.buf[offset..offset + WORD].copy_from_slice(&value.to_ne_bytes());
    }
}

/// Read-only view of a packed record.
///
/// Borrows the buffer it was packed into, so the record cannot outlive it or
/// observe a later lookup reusing the same storage.
#[derive(Debug, Clone, Copy)]
pub struct HostRecord<'a> {
    buf: &'a [u8],
    layout: RecordLayout,
}

impl<'a> HostRecord<'a> {
    /// Reattaches a layout to the buffer it was packed into.
    pub fn new(buf: &'a [u8], layout: RecordLayout) -> Self {
        debug_assert_eq!(buf.as_ptr() as usize, layout.base);
        Self { buf, layout }
    }

    #[inline]
    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Canonical name; empty when the entry had no host names.
    pub fn name(&self) -> &'a [u8] {
        cstr_at(self.buf, self.layout.name)
    }

    #[inline]
    pub fn family(&self) -> Family {
        self.layout.family
    }

    #[inline]
    pub fn addr_len(&self) -> usize {
        self.layout.family.addr_len()
    }

    /// Raw addresses, following the NULL-terminated address table.
    pub fn addresses(&self) -> impl Iterator<Item = &'a [u8]> + use<'a> {
        let buf = self.buf;
        let len = self.addr_len();
        PtrTable::new(buf, self.layout.base, self.layout.addr_list)
            .filter_map(move |off| buf.get(off..off + len))
    }

    /// Addresses as typed values.
    pub fn host_addrs(&self) -> impl Iterator<Item = HostAddr> + use<'a> {
        let family = self.family();
        self.addresses()
            .filter_map(move |bytes| HostAddr::from_bytes(family, bytes))
    }

    /// Alias names, following the NULL-terminated alias table.
    pub fn aliases(&self) -> impl Iterator<Item = &'a [u8]> + use<'a> {
        let buf = self.buf;
        PtrTable::new(buf, self.layout.base, self.layout.aliases).map(move |off| cstr_at(buf, off))
    }

    /// The whole buffer the record was packed into.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.buf
    }
}

/// Walks a NULL-terminated pointer table, yielding buffer offsets.
struct PtrTable<'a> {
    buf: &'a [u8],
    base: usize,
    cursor: usize,
}

impl<'a> PtrTable<'a> {
    fn new(buf: &'a [u8], base: usize, table: usize) -> Self {
        Self {
            buf,
            base,
            cursor: table,
        }
    }
}

impl Iterator for PtrTable<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let slot = self.buf.get(self.cursor..self.cursor + WORD)?;
        let mut word = [0u8; WORD];
        word.copy_from_slice(slot);
        let ptr = usize::from_ne_bytes(word);
        if ptr == 0 {
            return None;
        }
        self.cursor += WORD;
        let off = ptr.checked_sub(self.base)?;
        (off < self.buf.len()).then_some(off)
    }
}

/// Bytes from `off` up to (not including) the next NUL.
fn cstr_at(buf: &[u8], off: usize) -> &[u8] {
    let tail = buf.get(off..).unwrap_or(&[]);
    let len = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    &tail[..len]
}
