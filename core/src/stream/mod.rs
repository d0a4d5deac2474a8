// Copyright (c) 2023 The ledger-algo Developers

//! Streaming transaction reassembly and decoding.
//!
//! Transactions arrive as a sequence of arbitrarily sized chunks, these are
//! appended to a fixed capacity [WorkingBuffer] and incrementally decoded by a
//! [Decoder] which records its progress so decoding can resume when further
//! chunks arrive. [Session] ties these together with the [Txn][crate::txn::Txn]
//! record under construction.

mod buffer;
pub use buffer::{Overflow, WorkingBuffer};

mod decoder;
pub use decoder::{Decoder, Stage};

mod session;
pub use session::Session;

/// Wire status for a completed decode
pub const DECODE_COMPLETE: u8 = 0;

/// Wire status requesting the next chunk
pub const FETCH_MORE_DATA: u8 = 1;

/// Wire status for a failed decode
pub const TNX_DECODE_ERROR: u8 = 2;

/// Result of feeding data to the decoder
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum DecodeStatus {
    /// Further data is required, no partial field has been consumed
    NeedMoreData,
    /// The transaction record is fully populated
    Complete,
    /// Decoding failed, the session must be reset
    DecodeError(DecodeError),
}

impl DecodeStatus {
    /// Fetch wire status code for a decode result
    pub fn code(&self) -> u8 {
        match self {
            DecodeStatus::Complete => DECODE_COMPLETE,
            DecodeStatus::NeedMoreData => FETCH_MORE_DATA,
            DecodeStatus::DecodeError(_) => TNX_DECODE_ERROR,
        }
    }

    /// Check whether decoding is complete
    pub fn is_complete(&self) -> bool {
        matches!(self, DecodeStatus::Complete)
    }
}

/// Transaction decoding errors
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[repr(u8)]
pub enum DecodeError {
    /// Reserved / invalid MessagePack marker
    #[cfg_attr(feature = "thiserror", error("invalid type tag"))]
    InvalidTag = 0x01,

    /// Value has the wrong MessagePack type for its field
    #[cfg_attr(feature = "thiserror", error("unexpected value type"))]
    UnexpectedType = 0x02,

    /// Unknown transaction field
    #[cfg_attr(feature = "thiserror", error("unknown field"))]
    UnknownField = 0x03,

    /// Field appears more than once
    #[cfg_attr(feature = "thiserror", error("duplicate field"))]
    DuplicateField = 0x04,

    /// Unknown transaction type
    #[cfg_attr(feature = "thiserror", error("unknown transaction type"))]
    UnknownTxnType = 0x05,

    /// Enumerated value out of range
    #[cfg_attr(feature = "thiserror", error("enumeration out of range"))]
    InvalidEnum = 0x06,

    /// Fixed size value has the wrong length
    #[cfg_attr(feature = "thiserror", error("invalid value length"))]
    InvalidLength = 0x07,

    /// Value does not fit the transaction record
    #[cfg_attr(feature = "thiserror", error("field too long"))]
    FieldTooLong = 0x08,

    /// Nesting exceeds the transaction schema
    #[cfg_attr(feature = "thiserror", error("nesting too deep"))]
    TooDeep = 0x09,

    /// Transaction exceeds working buffer capacity
    #[cfg_attr(feature = "thiserror", error("transaction exceeds working buffer"))]
    Overflow = 0x0a,

    /// Data following the transaction
    #[cfg_attr(feature = "thiserror", error("trailing bytes"))]
    TrailingBytes = 0x0b,

    /// Required field missing
    #[cfg_attr(feature = "thiserror", error("missing required field"))]
    MissingField = 0x0c,

    /// Field not valid for the transaction type
    #[cfg_attr(feature = "thiserror", error("field does not match transaction type"))]
    FieldTypeMismatch = 0x0d,

    /// Transaction ended before decoding completed
    #[cfg_attr(feature = "thiserror", error("transaction truncated"))]
    Truncated = 0x0e,

    /// String is not valid UTF-8
    #[cfg_attr(feature = "thiserror", error("invalid utf8"))]
    InvalidUtf8 = 0x0f,
}
