// Copyright (c) 2023 The ledger-algo Developers

use super::{DecodeError, DecodeStatus, Decoder, Stage, WorkingBuffer};
use crate::{consts::MAX_TX_SIZE, txn::Txn};

/// Signing session context.
///
/// Owns the working buffer, decoder cursor and transaction record for a
/// single signing request. At most one session is active at a time.
pub struct Session<const N: usize = MAX_TX_SIZE> {
    buff: WorkingBuffer<N>,
    decoder: Decoder,
    txn: Txn,
}

impl<const N: usize> Session<N> {
    /// Create a new (empty) session
    pub fn new() -> Self {
        Self {
            buff: WorkingBuffer::new(),
            decoder: Decoder::new(),
            txn: Txn::default(),
        }
    }

    /// Append a chunk and decode as far as the received data allows
    pub fn push(&mut self, chunk: &[u8]) -> DecodeStatus {
        // Failed sessions stay failed until reset
        if let Stage::Failed(e) = self.decoder.stage() {
            return DecodeStatus::DecodeError(e);
        }

        if self.buff.append(chunk).is_err() {
            #[cfg(feature = "log")]
            log::warn!(
                "chunk of {} bytes exceeds working buffer ({} / {})",
                chunk.len(),
                self.buff.offset(),
                N
            );

            return self.fail(DecodeError::Overflow);
        }

        let status = self
            .decoder
            .decode(self.buff.as_slice(), N, &mut self.txn);

        if let DecodeStatus::DecodeError(_) = status {
            self.txn.clear();
        }

        status
    }

    /// Force a failure, clearing any partially decoded record
    fn fail(&mut self, e: DecodeError) -> DecodeStatus {
        self.txn.clear();
        self.decoder.fail(e)
    }

    /// Finish a transaction, failing if decoding is incomplete
    pub fn finish(&mut self) -> DecodeStatus {
        match self.decoder.stage() {
            Stage::Done => DecodeStatus::Complete,
            Stage::Failed(e) => DecodeStatus::DecodeError(e),
            _ => self.fail(DecodeError::Truncated),
        }
    }

    /// Reset the session, zeroing buffer, cursor and record
    pub fn reset(&mut self) {
        self.buff.reset();
        self.decoder.reset();
        self.txn.clear();
    }

    /// Decoded (or partially decoded) transaction record
    pub fn txn(&self) -> &Txn {
        &self.txn
    }

    /// Received transaction bytes
    pub fn data(&self) -> &[u8] {
        self.buff.as_slice()
    }

    /// Decoder state
    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Check whether a complete transaction has been received
    pub fn is_complete(&self) -> bool {
        self.decoder.stage() == Stage::Done
    }
}

impl<const N: usize> Default for Session<N> {
    fn default() -> Self {
        Self::new()
    }
}
