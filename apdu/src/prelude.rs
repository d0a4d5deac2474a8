//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    public_key::{GetAddressReq, GetPublicKeyReq, PublicKeyResp},
    sign::{sign_chunks, SignMsgpackChunk, SignP1, SignP2, SignatureResp},
    CommandHeader, Instruction, StatusWord, ALGO_APDU_CLA, COMMAND_HEADER_LEN,
};
