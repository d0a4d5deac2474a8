// Copyright (c) 2023 The ledger-algo Developers

//! Transaction signing APDUs.
//!
//! Transactions are streamed to the device as their canonical MessagePack
//! encoding, split across a sequence of [SignMsgpackChunk] APDUs. Chunk
//! boundaries are arbitrary and need not align with MessagePack fields.
//!
//! `P1` marks continuation chunks and whether the first chunk carries an
//! account index, `P2` signals whether further chunks will follow.
//! The final chunk is answered with a [SignatureResp] once the user has
//! approved the transaction.

use encdec::{DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, ALGO_APDU_CLA};
use crate::helpers::{account, arr};

bitflags::bitflags! {
    /// Sign request `P1` flags
    pub struct SignP1: u8 {
        /// First chunk payload starts with a big-endian account index
        const WITH_ACCOUNT = 0x01;
        /// Continuation of a previously started transaction
        const MORE = 0x80;
    }
}

bitflags::bitflags! {
    /// Sign request `P2` flags
    pub struct SignP2: u8 {
        /// Further chunks follow this one
        const MORE = 0x80;
    }
}

/// MessagePack transaction chunk APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   ACCOUNT_INDEX (big-endian u32, only with P1 WITH_ACCOUNT)   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                       TRANSACTION BYTES                       /
/// /                       (variable length)                       /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct SignMsgpackChunk<'a> {
    /// Account index, only present on a first chunk
    pub account_index: Option<u32>,
    /// Chunk of the MessagePack encoded transaction
    pub data: &'a [u8],
    /// Set for every chunk after the first
    pub continuation: bool,
    /// Set when further chunks follow
    pub more: bool,
}

impl<'a> ApduStatic for SignMsgpackChunk<'a> {
    const CLA: u8 = ALGO_APDU_CLA;
    const INS: u8 = Instruction::SignMsgpack as u8;
}

impl<'a> SignMsgpackChunk<'a> {
    /// Create a new first chunk
    pub fn first(account_index: Option<u32>, data: &'a [u8], more: bool) -> Self {
        Self {
            account_index,
            data,
            continuation: false,
            more,
        }
    }

    /// Create a new continuation chunk
    pub fn next(data: &'a [u8], more: bool) -> Self {
        Self {
            account_index: None,
            data,
            continuation: true,
            more,
        }
    }

    /// `P1` flags for this chunk
    pub fn p1(&self) -> SignP1 {
        let mut p1 = SignP1::empty();
        p1.set(SignP1::MORE, self.continuation);
        p1.set(SignP1::WITH_ACCOUNT, self.account_index.is_some());
        p1
    }

    /// `P2` flags for this chunk
    pub fn p2(&self) -> SignP2 {
        let mut p2 = SignP2::empty();
        p2.set(SignP2::MORE, self.more);
        p2
    }

    /// Parse a chunk APDU from header parameters and payload
    pub fn parse(p1: u8, p2: u8, buff: &'a [u8]) -> Result<Self, ApduError> {
        let p1 = SignP1::from_bits(p1).ok_or(ApduError::InvalidEncoding)?;
        let p2 = SignP2::from_bits(p2).ok_or(ApduError::InvalidEncoding)?;

        let continuation = p1.contains(SignP1::MORE);

        // Account indices may only be supplied with the first chunk
        let (account_index, data) = match p1.contains(SignP1::WITH_ACCOUNT) {
            true if continuation => return Err(ApduError::InvalidEncoding),
            true if buff.len() < account::LEN => return Err(ApduError::InvalidLength),
            true => {
                let (a, n) = account::dec(&buff[..account::LEN])?;
                (a, &buff[n..])
            }
            false => (None, buff),
        };

        Ok(Self {
            account_index,
            data,
            continuation,
            more: p2.contains(SignP2::MORE),
        })
    }
}

impl<'a> Encode for SignMsgpackChunk<'a> {
    type Error = ApduError;

    /// Encode chunk payload (header flags are available via `p1` / `p2`)
    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let mut index = account::enc(&self.account_index, buff)?;

        buff[index..][..self.data.len()].copy_from_slice(self.data);
        index += self.data.len();

        Ok(index)
    }

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(account::enc_len(&self.account_index)? + self.data.len())
    }
}

/// Split a MessagePack encoded transaction into sign APDUs of at most
/// `chunk_size` payload bytes, host side counterpart to the device
/// reassembly.
pub fn sign_chunks(account_index: Option<u32>, txn: &[u8], chunk_size: usize) -> SignChunks<'_> {
    SignChunks {
        account_index,
        txn,
        chunk_size: chunk_size.max(1),
        index: 0,
        started: false,
    }
}

/// Iterator over the chunks of a transaction, see [sign_chunks]
#[derive(Clone, Debug)]
pub struct SignChunks<'a> {
    account_index: Option<u32>,
    txn: &'a [u8],
    chunk_size: usize,
    index: usize,
    started: bool,
}

impl<'a> Iterator for SignChunks<'a> {
    type Item = SignMsgpackChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        // Always emit at least the first chunk
        if self.started && self.index >= self.txn.len() {
            return None;
        }

        let first = !self.started;
        self.started = true;

        // The account index shares the first chunk payload
        let mut n = self.chunk_size;
        if first && self.account_index.is_some() {
            n = n.saturating_sub(account::LEN).max(1);
        }

        let data = &self.txn[self.index..];
        let data = &data[..data.len().min(n)];
        self.index += data.len();

        let more = self.index < self.txn.len();

        Some(match first {
            true => SignMsgpackChunk::first(self.account_index, data, more),
            false => SignMsgpackChunk::next(data, more),
        })
    }
}

/// Signature response APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                           SIGNATURE                           /
/// /                   (64-byte ed25519 signature)                 /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SignatureResp {
    /// ed25519 signature over `"TX" || transaction`
    pub signature: [u8; 64],
}

impl SignatureResp {
    /// Create a new [SignatureResp] APDU
    pub fn new(signature: [u8; 64]) -> Self {
        Self { signature }
    }
}

impl Encode for SignatureResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(self.signature.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        arr::enc(&self.signature, buff)
    }
}

impl DecodeOwned for SignatureResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        let (signature, n) = arr::dec(buff)?;
        Ok((Self { signature }, n))
    }
}
