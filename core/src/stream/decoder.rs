// Copyright (c) 2023 The ledger-algo Developers

use core::str::FromStr;

use super::{DecodeError, DecodeStatus};
use crate::{
    msgpack::{ReadError, Reader},
    txn::{Field, Txn},
};

/// Decoder stage
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub enum Stage {
    /// Awaiting the top-level map header
    #[default]
    Header,
    /// Decoding map entries
    Fields { remaining: usize },
    /// Transaction decoded
    Done,
    /// Decoding failed, reset required
    Failed(DecodeError),
}

/// Resumable transaction decoder.
///
/// Holds the position of the next undecoded byte, the current [Stage], and
/// the set of fields decoded so far. Each map entry is decoded atomically:
/// if the buffer does not yet hold the complete key and value the decoder
/// returns [DecodeStatus::NeedMoreData] with its state unchanged.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Decoder {
    index: usize,
    stage: Stage,
    seen: u64,
}

impl Decoder {
    /// Create a new decoder expecting the start of a transaction
    pub const fn new() -> Self {
        Self {
            index: 0,
            stage: Stage::Header,
            seen: 0,
        }
    }

    /// Offset of the next undecoded byte
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current decoder stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Mask of decoded fields (see [Field::mask])
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Reset decoder state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Decode as much of `buff` (the valid bytes of a buffer with total
    /// capacity `capacity`) as possible into `txn`
    pub fn decode(&mut self, buff: &[u8], capacity: usize, txn: &mut Txn) -> DecodeStatus {
        loop {
            match self.stage {
                Stage::Failed(e) => return DecodeStatus::DecodeError(e),
                Stage::Done if self.index < buff.len() => {
                    return self.fail(DecodeError::TrailingBytes)
                }
                Stage::Done => return DecodeStatus::Complete,
                Stage::Header => {
                    let mut r = Reader::new(buff, self.index, capacity);

                    match r.read_map_len() {
                        Ok(n) => {
                            #[cfg(feature = "log")]
                            log::debug!("txn map with {} fields", n);

                            self.index = r.index();
                            self.stage = Stage::Fields { remaining: n };
                        }
                        Err(ReadError::Incomplete) => return DecodeStatus::NeedMoreData,
                        Err(ReadError::Invalid(e)) => return self.fail(e),
                    }
                }
                Stage::Fields { remaining: 0 } => match txn.validate(self.seen) {
                    Ok(_) => self.stage = Stage::Done,
                    Err(e) => return self.fail(e),
                },
                Stage::Fields { remaining } => match self.field(buff, capacity, txn) {
                    Ok(_) => {
                        self.stage = Stage::Fields {
                            remaining: remaining - 1,
                        }
                    }
                    Err(ReadError::Incomplete) => return DecodeStatus::NeedMoreData,
                    Err(ReadError::Invalid(e)) => return self.fail(e),
                },
            }
        }
    }

    /// Decode a single map entry, advancing only once it is fully applied
    fn field(&mut self, buff: &[u8], capacity: usize, txn: &mut Txn) -> Result<(), ReadError> {
        let mut r = Reader::new(buff, self.index, capacity);

        let key = r.read_str()?;
        let field = Field::from_str(key).map_err(|_| DecodeError::UnknownField)?;
        if self.seen & field.mask() != 0 {
            return Err(DecodeError::DuplicateField.into());
        }

        // Measure the value before touching the record
        let start = r.index();
        r.skip_value(1)?;
        let end = r.index();

        let mut v = Reader::complete(&buff[..end], start);
        txn.apply(field, &mut v)?;

        #[cfg(feature = "log")]
        log::debug!("decoded field {} ({} bytes)", field, end - start);

        self.seen |= field.mask();
        self.index = end;

        Ok(())
    }

    /// Mark decoding as failed, the failure persists until reset
    pub(super) fn fail(&mut self, e: DecodeError) -> DecodeStatus {
        #[cfg(feature = "log")]
        log::warn!("txn decode failed at {}: {:?}", self.index, e);

        self.stage = Stage::Failed(e);
        DecodeStatus::DecodeError(e)
    }
}
