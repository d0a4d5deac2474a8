// Copyright (c) 2023 The ledger-algo Developers

//! Bounds checked MessagePack reader for partially received buffers.
//!
//! The [Reader] operates over the valid portion of the working buffer, and is
//! aware of the total buffer capacity so that reads running past the valid data
//! can be split into those that may complete once more data arrives
//! ([ReadError::Incomplete]) and those that never can ([DecodeError::Overflow]).

use byteorder::{BigEndian, ByteOrder};

use crate::{consts::MAX_DEPTH, stream::DecodeError};

/// Reserved MessagePack marker, never valid
pub const NEVER_USED: u8 = 0xc1;

const NIL: u8 = 0xc0;
const FALSE: u8 = 0xc2;
const TRUE: u8 = 0xc3;
const BIN8: u8 = 0xc4;
const BIN16: u8 = 0xc5;
const BIN32: u8 = 0xc6;
const UINT8: u8 = 0xcc;
const UINT16: u8 = 0xcd;
const UINT32: u8 = 0xce;
const UINT64: u8 = 0xcf;
const INT8: u8 = 0xd0;
const INT16: u8 = 0xd1;
const INT32: u8 = 0xd2;
const INT64: u8 = 0xd3;
const STR8: u8 = 0xd9;
const STR16: u8 = 0xda;
const STR32: u8 = 0xdb;
const ARRAY16: u8 = 0xdc;
const ARRAY32: u8 = 0xdd;
const MAP16: u8 = 0xde;
const MAP32: u8 = 0xdf;

/// Reader errors
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ReadError {
    /// More data is required to complete this read
    Incomplete,
    /// Data is malformed or can never fit the working buffer
    Invalid(DecodeError),
}

impl From<DecodeError> for ReadError {
    fn from(e: DecodeError) -> Self {
        ReadError::Invalid(e)
    }
}

/// Collapse reader errors for values already known to be complete
impl From<ReadError> for DecodeError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::Incomplete => DecodeError::Truncated,
            ReadError::Invalid(e) => e,
        }
    }
}

/// Map an unexpected marker to the appropriate decode error
fn unexpected(tag: u8) -> ReadError {
    match tag {
        NEVER_USED => ReadError::Invalid(DecodeError::InvalidTag),
        _ => ReadError::Invalid(DecodeError::UnexpectedType),
    }
}

/// MessagePack reader over a (potentially partial) buffer
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    /// Valid data
    buff: &'a [u8],
    /// Current read position
    index: usize,
    /// Capacity of the underlying buffer
    capacity: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over `buff` starting at `index`, where `buff` may
    /// grow up to `capacity` bytes
    pub fn new(buff: &'a [u8], index: usize, capacity: usize) -> Self {
        Self {
            buff,
            index,
            capacity,
        }
    }

    /// Create a reader over a complete buffer (no further data will arrive)
    pub fn complete(buff: &'a [u8], index: usize) -> Self {
        Self::new(buff, index, buff.len())
    }

    /// Fetch the current read position
    pub fn index(&self) -> usize {
        self.index
    }

    /// Consume `n` bytes
    fn take(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
        let end = self
            .index
            .checked_add(n)
            .ok_or(ReadError::Invalid(DecodeError::Overflow))?;

        if end > self.buff.len() {
            // Lengths past the buffer capacity can never be satisfied
            if end > self.capacity {
                return Err(ReadError::Invalid(DecodeError::Overflow));
            }
            return Err(ReadError::Incomplete);
        }

        let d = &self.buff[self.index..end];
        self.index = end;

        Ok(d)
    }

    /// Consume a single byte
    fn byte(&mut self) -> Result<u8, ReadError> {
        self.take(1).map(|d| d[0])
    }

    /// Consume an `n` byte big-endian unsigned integer
    fn be(&mut self, n: usize) -> Result<u64, ReadError> {
        self.take(n).map(|d| BigEndian::read_uint(d, n))
    }

    /// Consume an `n` byte big-endian length
    fn len(&mut self, n: usize) -> Result<usize, ReadError> {
        let l = self.be(n)?;
        usize::try_from(l).map_err(|_| ReadError::Invalid(DecodeError::Overflow))
    }

    /// Check a container of `n` entries could fit the remaining capacity
    /// (every entry requires at least one byte)
    fn check_entries(&self, n: usize) -> Result<usize, ReadError> {
        if n > self.capacity.saturating_sub(self.index) {
            return Err(ReadError::Invalid(DecodeError::Overflow));
        }
        Ok(n)
    }

    /// Read a map header, returning the number of key / value pairs
    pub fn read_map_len(&mut self) -> Result<usize, ReadError> {
        let n = match self.byte()? {
            t @ 0x80..=0x8f => (t & 0x0f) as usize,
            MAP16 => self.len(2)?,
            MAP32 => self.len(4)?,
            t => return Err(unexpected(t)),
        };
        self.check_entries(n)
    }

    /// Read an array header, returning the number of entries
    pub fn read_array_len(&mut self) -> Result<usize, ReadError> {
        let n = match self.byte()? {
            t @ 0x90..=0x9f => (t & 0x0f) as usize,
            ARRAY16 => self.len(2)?,
            ARRAY32 => self.len(4)?,
            t => return Err(unexpected(t)),
        };
        self.check_entries(n)
    }

    /// Read an unsigned integer
    pub fn read_u64(&mut self) -> Result<u64, ReadError> {
        match self.byte()? {
            t @ 0x00..=0x7f => Ok(t as u64),
            UINT8 => self.be(1),
            UINT16 => self.be(2),
            UINT32 => self.be(4),
            UINT64 => self.be(8),
            t => Err(unexpected(t)),
        }
    }

    /// Read a boolean
    pub fn read_bool(&mut self) -> Result<bool, ReadError> {
        match self.byte()? {
            FALSE => Ok(false),
            TRUE => Ok(true),
            t => Err(unexpected(t)),
        }
    }

    /// Read a UTF-8 string
    pub fn read_str(&mut self) -> Result<&'a str, ReadError> {
        let n = match self.byte()? {
            t @ 0xa0..=0xbf => (t & 0x1f) as usize,
            STR8 => self.len(1)?,
            STR16 => self.len(2)?,
            STR32 => self.len(4)?,
            t => return Err(unexpected(t)),
        };

        let d = self.take(n)?;
        core::str::from_utf8(d).map_err(|_| ReadError::Invalid(DecodeError::InvalidUtf8))
    }

    /// Read a byte array
    pub fn read_bin(&mut self) -> Result<&'a [u8], ReadError> {
        let n = match self.byte()? {
            BIN8 => self.len(1)?,
            BIN16 => self.len(2)?,
            BIN32 => self.len(4)?,
            t => return Err(unexpected(t)),
        };

        self.take(n)
    }

    /// Read a byte array of exactly `N` bytes
    pub fn read_bin_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let d = self.read_bin()?;
        if d.len() != N {
            return Err(ReadError::Invalid(DecodeError::InvalidLength));
        }

        let mut a = [0u8; N];
        a.copy_from_slice(d);
        Ok(a)
    }

    /// Skip a complete value, including any nested entries.
    ///
    /// Used to measure a value before decoding so that partially received
    /// values are never applied. `depth` is the nesting level of the value.
    pub fn skip_value(&mut self, depth: usize) -> Result<(), ReadError> {
        let tag = self.byte()?;

        let (entries, len) = match tag {
            0x00..=0x7f | 0xe0..=0xff | NIL | FALSE | TRUE => (0, 0),
            UINT8 | INT8 => (0, 1),
            UINT16 | INT16 => (0, 2),
            UINT32 | INT32 => (0, 4),
            UINT64 | INT64 => (0, 8),
            0xa0..=0xbf => (0, (tag & 0x1f) as usize),
            STR8 | BIN8 => (0, self.len(1)?),
            STR16 | BIN16 => (0, self.len(2)?),
            STR32 | BIN32 => (0, self.len(4)?),
            0x90..=0x9f => (tag as usize & 0x0f, 0),
            ARRAY16 => (self.len(2)?, 0),
            ARRAY32 => (self.len(4)?, 0),
            0x80..=0x8f => ((tag as usize & 0x0f) * 2, 0),
            MAP16 => (self.len(2)?.saturating_mul(2), 0),
            MAP32 => (self.len(4)?.saturating_mul(2), 0),
            // Floats and extensions have no place in a transaction
            t => return Err(unexpected(t)),
        };

        self.take(len)?;

        if entries > 0 {
            if depth >= MAX_DEPTH {
                return Err(ReadError::Invalid(DecodeError::TooDeep));
            }
            self.check_entries(entries)?;

            for _ in 0..entries {
                self.skip_value(depth + 1)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_scalars() {
        let d = [
            0x05, // fixint
            0xcd, 0x01, 0x00, // uint16
            0xcf, 0, 0, 0, 1, 0, 0, 0, 0, // uint64
            0xc3, // true
            0xa3, b'p', b'a', b'y', // fixstr
            0xc4, 0x02, 0xaa, 0xbb, // bin8
        ];
        let mut r = Reader::complete(&d, 0);

        assert_eq!(r.read_u64(), Ok(5));
        assert_eq!(r.read_u64(), Ok(256));
        assert_eq!(r.read_u64(), Ok(1 << 32));
        assert_eq!(r.read_bool(), Ok(true));
        assert_eq!(r.read_str(), Ok("pay"));
        assert_eq!(r.read_bin(), Ok(&[0xaa, 0xbb][..]));
        assert_eq!(r.index(), d.len());
    }

    #[test]
    fn incomplete_vs_overflow() {
        // bin16 declaring 8 bytes with only 2 present
        let d = [0xc5, 0x00, 0x08, 0x01, 0x02];

        // Could complete within capacity
        let mut r = Reader::new(&d, 0, 64);
        assert_eq!(r.read_bin(), Err(ReadError::Incomplete));

        // Can never complete
        let mut r = Reader::new(&d, 0, 8);
        assert_eq!(
            r.read_bin(),
            Err(ReadError::Invalid(DecodeError::Overflow))
        );
    }

    #[test]
    fn header_incomplete() {
        // uint64 marker without value
        let mut r = Reader::new(&[0xcf, 0x00], 0, 64);
        assert_eq!(r.read_u64(), Err(ReadError::Incomplete));

        // Empty buffer
        let mut r = Reader::new(&[], 0, 64);
        assert_eq!(r.read_map_len(), Err(ReadError::Incomplete));
    }

    #[test]
    fn invalid_markers() {
        let mut r = Reader::complete(&[NEVER_USED], 0);
        assert_eq!(
            r.read_u64(),
            Err(ReadError::Invalid(DecodeError::InvalidTag))
        );

        let mut r = Reader::complete(&[0xa1, b'x'], 0);
        assert_eq!(
            r.read_u64(),
            Err(ReadError::Invalid(DecodeError::UnexpectedType))
        );

        let mut r = Reader::complete(&[0xc4, 0x01, 0x00], 0);
        assert_eq!(
            r.read_bin_array::<32>(),
            Err(ReadError::Invalid(DecodeError::InvalidLength))
        );
    }

    #[test]
    fn skip_nested() {
        // {"a": [1, "b"], "c": {"d": true}}
        let d = [
            0x82, 0xa1, b'a', 0x92, 0x01, 0xa1, b'b', 0xa1, b'c', 0x81, 0xa1, b'd', 0xc3,
        ];

        let mut r = Reader::complete(&d, 0);
        assert_eq!(r.skip_value(0), Ok(()));
        assert_eq!(r.index(), d.len());

        // Every proper prefix is incomplete
        for n in 0..d.len() {
            let mut r = Reader::new(&d[..n], 0, 64);
            assert_eq!(r.skip_value(0), Err(ReadError::Incomplete), "prefix {n}");
        }
    }

    #[test]
    fn skip_depth_limit() {
        // [[[[1]]]]
        let d = [0x91, 0x91, 0x91, 0x91, 0x01];

        let mut r = Reader::complete(&d, 0);
        assert_eq!(
            r.skip_value(0),
            Err(ReadError::Invalid(DecodeError::TooDeep))
        );
    }

    #[test]
    fn skip_rejects_oversized_containers() {
        // array32 with more entries than the buffer could hold
        let d = [0xdd, 0xff, 0xff, 0xff, 0xff];

        let mut r = Reader::new(&d, 0, 900);
        assert_eq!(
            r.skip_value(0),
            Err(ReadError::Invalid(DecodeError::Overflow))
        );
    }
}
