// Copyright (c) 2023 The ledger-algo Developers

use encdec::Encode;
use heapless::String;

use ledger_proto::ApduError;

use crate::{apdu, consts::ADDRESS_LEN};

/// [`Engine`][super::Engine] outputs (in response to events), typically encoded to response [APDUs][crate::apdu]
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    None,

    /// Account public key
    PublicKey { public_key: [u8; 32] },

    /// Account public key with formatted address for display
    Address {
        public_key: [u8; 32],
        address: String<ADDRESS_LEN>,
    },

    /// Transaction incomplete, request the next chunk
    FetchMore,

    /// Transaction decoded, waiting for user approval
    Pending,

    /// Transaction signature
    Signature { signature: [u8; 64] },
}

impl Output {
    /// Encode an [`Output`] object to a response [APDU]
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        match self {
            Output::None | Output::FetchMore | Output::Pending => Ok(0),
            Output::PublicKey { public_key } | Output::Address { public_key, .. } => {
                apdu::public_key::PublicKeyResp::new(*public_key).encode(buff)
            }
            Output::Signature { signature } => {
                apdu::sign::SignatureResp::new(*signature).encode(buff)
            }
        }
    }

    /// Fetch the formatted address for outputs containing this
    pub fn address(&self) -> Option<&str> {
        match self {
            Output::Address { address, .. } => Some(address.as_str()),
            _ => None,
        }
    }
}
