// Copyright (c) 2023 The ledger-algo Developers

//! Protocol / APDU definitions for Algorand app communication
//!
//! This module provides the wire definitions for requesting public keys,
//! displaying addresses, and streaming MessagePack encoded transactions
//! to the wallet for signing.
//!
//! Unlike most of the ledger ecosystem the Algorand app uses big-endian
//! encodings for integer fields (account indices), and the transaction
//! payload itself is the canonical MessagePack encoding produced by the
//! Algorand SDKs, split across as many APDUs as required.
//!

#![no_std]

use num_enum::TryFromPrimitive;

pub use ledger_proto::{ApduError, ApduReq, ApduStatic};

pub mod prelude;
pub mod public_key;
pub mod sign;

mod helpers;

/// Algorand APDU Class
pub const ALGO_APDU_CLA: u8 = 0x80;

/// Maximum APDU payload length
pub const MAX_APDU_PAYLOAD: usize = 255;

/// Command APDU header length (`CLA INS P1 P2 Lc`)
pub const COMMAND_HEADER_LEN: usize = 5;

/// Short command APDU header
///
/// ## Encoding:
/// ```text
/// +-------+-------+-------+-------+-------+---------------------+
/// |  CLA  |  INS  |  P1   |  P2   |  Lc   |  DATA (Lc bytes)    |
/// +-------+-------+-------+-------+-------+---------------------+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CommandHeader {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    /// Declared payload length
    pub lc: u8,
}

impl CommandHeader {
    /// Create a header for an Algorand command with a payload of `lc` bytes
    pub fn new(ins: u8, p1: u8, p2: u8, lc: u8) -> Self {
        Self {
            cla: ALGO_APDU_CLA,
            ins,
            p1,
            p2,
            lc,
        }
    }

    /// Split a command APDU into header and payload.
    ///
    /// The declared `Lc` must match the received payload, a bare four byte
    /// header is accepted as a command without payload.
    pub fn parse(cmd: &[u8]) -> Result<(Self, &[u8]), ApduError> {
        let (lc, data) = match cmd.len() {
            4 => (0, &cmd[4..]),
            n if n >= COMMAND_HEADER_LEN => (cmd[4], &cmd[COMMAND_HEADER_LEN..]),
            _ => return Err(ApduError::InvalidLength),
        };

        if data.len() != lc as usize {
            return Err(ApduError::InvalidLength);
        }

        let h = Self {
            cla: cmd[0],
            ins: cmd[1],
            p1: cmd[2],
            p2: cmd[3],
            lc,
        };

        Ok((h, data))
    }

    /// Encode the header to the first [COMMAND_HEADER_LEN] bytes of `buff`
    pub fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < COMMAND_HEADER_LEN {
            return Err(ApduError::InvalidLength);
        }

        buff[..COMMAND_HEADER_LEN]
            .copy_from_slice(&[self.cla, self.ins, self.p1, self.p2, self.lc]);

        Ok(COMMAND_HEADER_LEN)
    }
}

/// Algorand APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// Fetch the public key for an account
    GetPublicKey = 0x03,

    /// Fetch the public key for an account and show the address on the device
    GetAddress = 0x04,

    /// Stream a MessagePack encoded transaction for signing
    SignMsgpack = 0x08,
}

/// Status words returned by the Algorand app
#[derive(Copy, Clone, Debug, PartialEq, TryFromPrimitive)]
#[repr(u16)]
pub enum StatusWord {
    /// Command completed
    Ok = 0x9000,

    /// Transaction does not fit in the device working buffer
    WrongLength = 0x6700,

    /// Operation rejected by the user or not valid in the current state
    ConditionsNotSatisfied = 0x6985,

    /// Request payload has an invalid length
    InvalidPayload = 0x6a85,

    /// Unsupported instruction
    InsNotSupported = 0x6d00,

    /// Transaction decoding failed
    InvalidTransaction = 0x6e00,
}

impl StatusWord {
    /// Check whether a status word indicates success
    pub fn is_ok(&self) -> bool {
        *self == StatusWord::Ok
    }
}
