// Copyright (c) 2023 The ledger-algo Developers

//! Public key APDUs, for fetching account keys and displaying addresses

use encdec::{DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, ALGO_APDU_CLA};
use crate::helpers::*;

/// Public key request APDU.
///
/// Requests the ed25519 public key for the provided account index,
/// an empty payload requests the default account (index 0).
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |             ACCOUNT_INDEX (optional, big-endian u32)          |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct GetPublicKeyReq {
    /// Account index, `None` for the default account
    pub account_index: Option<u32>,
}

impl GetPublicKeyReq {
    /// Create a new [GetPublicKeyReq] APDU
    pub fn new(account_index: Option<u32>) -> Self {
        Self { account_index }
    }
}

impl ApduStatic for GetPublicKeyReq {
    const CLA: u8 = ALGO_APDU_CLA;
    const INS: u8 = Instruction::GetPublicKey as u8;
}

impl Encode for GetPublicKeyReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        account::enc_len(&self.account_index)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        account::enc(&self.account_index, buff)
    }
}

impl DecodeOwned for GetPublicKeyReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        let (account_index, n) = account::dec(buff)?;
        Ok((Self { account_index }, n))
    }
}

/// Address display request APDU.
///
/// Identical in encoding to [GetPublicKeyReq], additionally requesting the
/// device show the derived address for user verification.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct GetAddressReq {
    /// Account index, `None` for the default account
    pub account_index: Option<u32>,
}

impl GetAddressReq {
    /// Create a new [GetAddressReq] APDU
    pub fn new(account_index: Option<u32>) -> Self {
        Self { account_index }
    }
}

impl ApduStatic for GetAddressReq {
    const CLA: u8 = ALGO_APDU_CLA;
    const INS: u8 = Instruction::GetAddress as u8;
}

impl Encode for GetAddressReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        account::enc_len(&self.account_index)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        account::enc(&self.account_index, buff)
    }
}

impl DecodeOwned for GetAddressReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        let (account_index, n) = account::dec(buff)?;
        Ok((Self { account_index }, n))
    }
}

/// Public key response APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                          PUBLIC_KEY                           /
/// /                  (32-byte ed25519 public key)                 /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PublicKeyResp {
    /// ed25519 public key
    pub public_key: [u8; 32],
}

impl PublicKeyResp {
    /// Create a new [PublicKeyResp] APDU
    pub fn new(public_key: [u8; 32]) -> Self {
        Self { public_key }
    }
}

impl Encode for PublicKeyResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(self.public_key.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        arr::enc(&self.public_key, buff)
    }
}

impl DecodeOwned for PublicKeyResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        let (public_key, n) = arr::dec(buff)?;
        Ok((Self { public_key }, n))
    }
}
