//! Line-oriented tokenizer for hosts files.
//!
//! The scanner reads one whitespace-delimited token per call and reports
//! whether the line ended right after it, which is all the match engine needs
//! to tell "more names follow" from "entry complete". It works on any
//! `BufRead + Seek` stream and tracks its own byte position so a caller can
//! re-enter a line it has already read.
//!
//! # Comments
//!
//! - A token starting with `#` discards the rest of the line and yields
//!   [`Scan::Comment`].
//! - A `#` inside a token cuts the token there; the rest of the line is
//!   discarded and the token is reported as ending the line.
//!
//! A NUL byte inside a token ends the kept text; the bytes after it up to the
//! next blank are read and dropped.

use std::io::{self, BufRead, ErrorKind, Seek, SeekFrom};

use crate::inet::INET6_ADDRSTRLEN;

/// Longest address token kept (`INET6_ADDRSTRLEN`).
pub const MAX_ADDR_TOKEN: usize = INET6_ADDRSTRLEN;

/// Longest host name token kept (`_POSIX_HOST_NAME_MAX`).
pub const MAX_NAME_TOKEN: usize = 255;

/// One token read from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a [u8],
    /// A newline (or end of stream) followed the token.
    pub eol: bool,
}

/// Result of a single [`Scanner::next_token`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan<'a> {
    Token(Token<'a>),
    /// A whole-line or trailing comment was consumed; no token.
    Comment,
    Eof,
}

pub struct Scanner<R> {
    reader: R,
    pos: u64,
    token: [u8; MAX_NAME_TOKEN],
}

impl<R: BufRead + Seek> Scanner<R> {
    /// Wraps a stream positioned at its start.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pos: 0,
            token: [0; MAX_NAME_TOKEN],
        }
    }

    /// Byte offset of the next unread byte.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Moves the read position back (or forward) to `pos`.
    pub fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    /// Reads the next token, keeping at most `limit` bytes of it.
    ///
    /// Leading whitespace, blank lines included, is skipped. Bytes past the
    /// limit are dropped together with the rest of that token.
    pub fn next_token(&mut self, limit: usize) -> io::Result<Scan<'_>> {
        loop {
            match self.peek()? {
                None => return Ok(Scan::Eof),
                Some(b) if is_space(b) => self.bump(),
                Some(_) => break,
            }
        }

        if self.peek()? == Some(b'#') {
            self.skip_line()?;
            return Ok(Scan::Comment);
        }

        let limit = limit.min(self.token.len());
        let mut len = 0usize;
        let mut comment = false;
        let mut cut = false;
        while let Some(b) = self.peek()? {
            if is_space(b) {
                break;
            }
            if b == b'#' {
                comment = true;
                break;
            }
            cut |= b == 0;
            if !cut && len < limit {
                self.token[len] = b;
                len += 1;
            }
            self.bump();
        }

        let eol = if comment {
            self.skip_line()?;
            true
        } else {
            self.eat_to_newline()?
        };

        Ok(Scan::Token(Token {
            text: &self.token[..len],
            eol,
        }))
    }

    /// Discards everything up to and including the next newline.
    pub fn skip_line(&mut self) -> io::Result<()> {
        while let Some(b) = self.peek()? {
            self.bump();
            if b == b'\n' {
                break;
            }
        }
        Ok(())
    }

    /// Skips blanks after a token; true when a newline or end of stream
    /// comes before the next token.
    fn eat_to_newline(&mut self) -> io::Result<bool> {
        loop {
            match self.peek()? {
                None => return Ok(true),
                Some(b'\n') => {
                    self.bump();
                    return Ok(true);
                }
                Some(b) if is_space(b) => self.bump(),
                Some(_) => return Ok(false),
            }
        }
    }

    fn peek(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    #[inline]
    fn bump(&mut self) {
        self.reader.consume(1);
        self.pos += 1;
    }
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}
