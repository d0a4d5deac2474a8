// Copyright (c) 2023 The ledger-algo Developers

use encdec::DecodeOwned;

use ledger_algo_apdu::prelude::*;

use super::Error;
use crate::consts::HARDENED;

/// [`Engine`][super::Engine] input events, typically decoded from request [APDUs][crate::apdu]
#[derive(Clone, PartialEq, Debug)]
pub enum Event<'a> {
    None,

    /// Fetch the public key for an account
    GetPublicKey { account_index: u32 },

    /// Fetch the public key for an account and show the address
    ShowAddress { account_index: u32 },

    /// Transaction chunk for signing
    SignChunk {
        /// Start of a new transaction
        first: bool,
        /// Further chunks follow
        more: bool,
        /// Signing account, only valid on the first chunk
        account_index: Option<u32>,
        /// MessagePack encoded transaction data
        data: &'a [u8],
    },
}

/// Parse a get-public-key payload, returning the requested account index
///
/// Payloads are either empty (default account) or a 4-byte big-endian
/// account index, which must be hardenable.
pub fn parse_get_public_key(buff: &[u8]) -> Result<u32, Error> {
    let (req, _n) = GetPublicKeyReq::decode_owned(buff).map_err(|_| Error::InvalidLength)?;
    check_account(req.account_index.unwrap_or(0))
}

/// Check an account index can be used in a hardened derivation path
fn check_account(account_index: u32) -> Result<u32, Error> {
    match account_index & HARDENED {
        0 => Ok(account_index),
        _ => Err(Error::InvalidAccount),
    }
}

impl<'a> Event<'a> {
    /// Parse an incoming APDU to engine event
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn parse(ins: u8, p1: u8, p2: u8, buff: &'a [u8]) -> Result<Self, Error> {
        match Instruction::try_from(ins) {
            Ok(Instruction::GetPublicKey) => {
                let account_index = parse_get_public_key(buff)?;
                Ok(Event::GetPublicKey { account_index })
            }
            Ok(Instruction::GetAddress) => {
                let (req, _n) =
                    GetAddressReq::decode_owned(buff).map_err(|_| Error::InvalidLength)?;
                let account_index = check_account(req.account_index.unwrap_or(0))?;
                Ok(Event::ShowAddress { account_index })
            }
            Ok(Instruction::SignMsgpack) => {
                let c =
                    SignMsgpackChunk::parse(p1, p2, buff).map_err(|_| Error::InvalidLength)?;
                Ok(Event::from(c))
            }
            Err(_) => Err(Error::UnknownInstruction),
        }
    }
}

impl<'a> From<SignMsgpackChunk<'a>> for Event<'a> {
    fn from(c: SignMsgpackChunk<'a>) -> Self {
        Event::SignChunk {
            first: !c.continuation,
            more: c.more,
            account_index: c.account_index,
            data: c.data,
        }
    }
}
