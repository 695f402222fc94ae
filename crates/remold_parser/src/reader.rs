//! Offset-tracking reader.
//!
//! [`FormatPreservingReader`] sits between a parser and its input. Everything
//! the parser reads is also decoded into a retained text window, so the
//! parser can later ask for the exact text between two offsets: the prefix
//! (whitespace, comments) in front of a token, or the token's own text.
//!
//! Offsets are counted in the parser's unit ([`OffsetUnit`]). Characters that
//! take more UTF-8 bytes than event units are recorded as adjustments, so an
//! event offset maps onto the right buffer position wherever such characters
//! occur.

use std::io::{self, Read};

use crate::OffsetError;

/// Unit in which a parser's token events count offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetUnit {
    /// UTF-8 bytes.
    Byte,
    /// Unicode scalar values.
    #[default]
    Char,
    /// UTF-16 code units.
    Utf16,
}

impl OffsetUnit {
    /// Number of units `ch` occupies.
    #[inline]
    pub fn width(self, ch: char) -> usize {
        match self {
            OffsetUnit::Byte => ch.len_utf8(),
            OffsetUnit::Char => 1,
            OffsetUnit::Utf16 => ch.len_utf16(),
        }
    }
}

/// A token reported by a parser's event source.
///
/// `start` is the offset of the first unit, `end` is exclusive.
pub trait TokenEvent {
    fn start(&self) -> usize;
    fn end(&self) -> usize;
}

/// Record for a character wider in UTF-8 than in event units.
#[derive(Debug, Clone, Copy)]
struct Adjustment {
    /// Event offset right after the character.
    end: usize,
    /// Total extra bytes of all wide characters up to and including this one.
    extra: usize,
}

/// Reader that keeps a sliding window of the decoded input.
///
/// # Window policy
///
/// Text is retained from [`retained_from`](Self::retained_from) onward. A
/// non-empty [`prefix_between`](Self::prefix_between) result discards
/// everything before its `last_end`; asking for text before the window
/// afterwards is a [`OffsetError::StaleOffset`].
///
/// # Example
///
/// ```rust
/// use std::io::Read;
/// use remold_parser::FormatPreservingReader;
///
/// let mut reader = FormatPreservingReader::new("a:  b\n".as_bytes());
/// let mut sink = Vec::new();
/// reader.read_to_end(&mut sink).unwrap();
///
/// assert_eq!(reader.substring(0, 0).unwrap(), "a");
/// assert_eq!(reader.prefix_between(2, 4).unwrap(), "  ");
/// assert_eq!(reader.substring(4, 4).unwrap(), "b");
/// ```
pub struct FormatPreservingReader<R> {
    inner: R,
    unit: OffsetUnit,
    /// Bytes of a UTF-8 sequence split across reads.
    pending: Vec<u8>,
    /// Decoded text starting at `retained_from`.
    buffer: String,
    retained_from: usize,
    consumed: usize,
    adjustments: Vec<Adjustment>,
    /// Cumulative extra bytes before `retained_from`.
    extra_base: usize,
    extra_total: usize,
}

impl<R: Read> FormatPreservingReader<R> {
    /// Creates a reader counting offsets in Unicode scalar values.
    pub fn new(inner: R) -> Self {
        Self::with_unit(inner, OffsetUnit::default())
    }

    /// Creates a reader counting offsets in `unit`.
    pub fn with_unit(inner: R, unit: OffsetUnit) -> Self {
        Self {
            inner,
            unit,
            pending: Vec::new(),
            buffer: String::new(),
            retained_from: 0,
            consumed: 0,
            adjustments: Vec::new(),
            extra_base: 0,
            extra_total: 0,
        }
    }

    /// Consumes the reader, returning the wrapped input.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn absorb(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.pending.extend_from_slice(bytes);

        let valid = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.len(),
            // Incomplete trailing sequence: wait for the next read.
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => return Err(io::Error::new(io::ErrorKind::InvalidData, err)),
        };
        let text = std::str::from_utf8(&self.pending[..valid])
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

        for ch in text.chars() {
            let units = self.unit.width(ch);
            self.consumed += units;
            let extra = ch.len_utf8() - units;
            if extra > 0 {
                self.extra_total += extra;
                self.adjustments.push(Adjustment {
                    end: self.consumed,
                    extra: self.extra_total,
                });
            }
        }
        self.buffer.push_str(text);
        self.pending.drain(..valid);
        Ok(())
    }
}

impl<R> FormatPreservingReader<R> {
    /// Event units decoded so far.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Oldest offset still retained.
    #[inline]
    pub fn retained_from(&self) -> usize {
        self.retained_from
    }

    /// Unit in which offsets are counted.
    #[inline]
    pub fn unit(&self) -> OffsetUnit {
        self.unit
    }

    /// Exact text in `[last_end, start_index)`.
    ///
    /// Returns an empty string when both are equal. After a non-empty result
    /// everything before `last_end` is discarded.
    pub fn prefix_between(&mut self, last_end: usize, start_index: usize) -> Result<String, OffsetError> {
        self.check_retained(last_end)?;
        if start_index < last_end || start_index > self.consumed {
            return Err(OffsetError::MalformedRange {
                start: last_end,
                end: start_index,
                available: self.consumed,
            });
        }
        if start_index == last_end {
            return Ok(String::new());
        }

        let prefix = self.slice(last_end, start_index)?.to_string();
        self.discard_before(last_end);
        Ok(prefix)
    }

    /// Same as [`prefix_between`](Self::prefix_between), using the event's
    /// start offset.
    pub fn prefix_before<E: TokenEvent + ?Sized>(&mut self, last_end: usize, event: &E) -> Result<String, OffsetError> {
        self.prefix_between(last_end, event.start())
    }

    /// Exact text in `[start, end]`, both inclusive.
    pub fn substring(&self, start: usize, end: usize) -> Result<String, OffsetError> {
        self.check_retained(start)?;
        if end < start || end >= self.consumed {
            return Err(OffsetError::MalformedRange {
                start,
                end,
                available: self.consumed,
            });
        }
        self.slice(start, end + 1).map(str::to_string)
    }

    /// Exact text of an event, `[start, end)`.
    pub fn event_text<E: TokenEvent + ?Sized>(&self, event: &E) -> Result<String, OffsetError> {
        if event.end() <= event.start() {
            return Err(OffsetError::MalformedRange {
                start: event.start(),
                end: event.end(),
                available: self.consumed,
            });
        }
        self.substring(event.start(), event.end() - 1)
    }

    fn check_retained(&self, offset: usize) -> Result<(), OffsetError> {
        if offset < self.retained_from {
            return Err(OffsetError::StaleOffset {
                requested: offset,
                retained_from: self.retained_from,
            });
        }
        Ok(())
    }

    /// Cumulative extra bytes of wide characters ending at or before `offset`.
    fn extra_before(&self, offset: usize) -> usize {
        let index = self.adjustments.partition_point(|adj| adj.end <= offset);
        match index {
            0 => self.extra_base,
            _ => self.adjustments[index - 1].extra,
        }
    }

    fn byte_index(&self, offset: usize) -> usize {
        offset - self.retained_from + self.extra_before(offset) - self.extra_base
    }

    fn slice(&self, start: usize, end: usize) -> Result<&str, OffsetError> {
        let malformed = || OffsetError::MalformedRange {
            start,
            end,
            available: self.consumed,
        };
        let from = self.byte_index(start);
        let to = self.byte_index(end);
        self.buffer.get(from..to).ok_or_else(malformed)
    }

    fn discard_before(&mut self, offset: usize) {
        if offset <= self.retained_from {
            return;
        }
        let bytes = self.byte_index(offset);
        let base = self.extra_before(offset);
        let dropped = self.adjustments.partition_point(|adj| adj.end <= offset);

        self.buffer.drain(..bytes);
        self.adjustments.drain(..dropped);
        self.extra_base = base;
        self.retained_from = offset;
    }
}

impl<R: Read> Read for FormatPreservingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        if read > 0 {
            self.absorb(&buf[..read])?;
        } else if !buf.is_empty() && !self.pending.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "stream ended inside a UTF-8 sequence",
            ));
        }
        Ok(read)
    }
}
