// Copyright (c) 2023 The ledger-algo Developers

use crate::{apdu::StatusWord, stream::DecodeError};

/// [Engine][super::Engine] errors
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum Error {
    /// Invalid request payload
    #[cfg_attr(feature = "thiserror", error("Invalid request payload"))]
    InvalidLength,

    /// Account index can not be hardened
    #[cfg_attr(feature = "thiserror", error("Invalid account index"))]
    InvalidAccount,

    /// Unexpected event
    #[cfg_attr(feature = "thiserror", error("Unexpected event"))]
    UnexpectedEvent,

    /// Unsupported instruction
    #[cfg_attr(feature = "thiserror", error("Unsupported instruction"))]
    UnknownInstruction,

    /// Transaction rejected by the user
    #[cfg_attr(feature = "thiserror", error("Transaction rejected"))]
    Rejected,

    /// Message encoding failed
    #[cfg_attr(feature = "thiserror", error("message encoding failed"))]
    EncodingFailed,

    /// Transaction decoding failed
    #[cfg_attr(feature = "thiserror", error("transaction decode failed: {0}"))]
    Decode(DecodeError),
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl Error {
    /// Map an error to the status word returned to the host
    pub fn status_word(&self) -> StatusWord {
        match self {
            Error::InvalidLength | Error::InvalidAccount => StatusWord::InvalidPayload,
            Error::UnexpectedEvent | Error::Rejected | Error::EncodingFailed => {
                StatusWord::ConditionsNotSatisfied
            }
            Error::UnknownInstruction => StatusWord::InsNotSupported,
            Error::Decode(DecodeError::Overflow) => StatusWord::WrongLength,
            Error::Decode(_) => StatusWord::InvalidTransaction,
        }
    }
}
