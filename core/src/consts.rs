// Copyright (c) 2023 The ledger-algo Developers

//! Algorand engine constants

use static_assertions::const_assert;

/// Transaction working buffer capacity
pub const MAX_TX_SIZE: usize = 900;

/// Prefix applied to encoded transactions prior to signing
pub const TX_SIGN_PREFIX: &[u8] = b"TX";

/// Maximum transaction note length
pub const MAX_NOTE_LEN: usize = 256;

/// Maximum genesis ID length
pub const MAX_GENESIS_ID_LEN: usize = 32;

/// Maximum asset unit name length
pub const MAX_UNIT_NAME_LEN: usize = 8;

/// Maximum asset name length
pub const MAX_ASSET_NAME_LEN: usize = 32;

/// Maximum asset URL length
pub const MAX_ASSET_URL_LEN: usize = 96;

/// Maximum number of application call accounts
pub const MAX_APP_ACCOUNTS: usize = 4;

/// Maximum number of application call arguments
pub const MAX_APP_ARGS: usize = 16;

/// Maximum length of each application call argument
pub const MAX_APP_ARG_LEN: usize = 32;

/// Maximum number of foreign apps / assets per application call
pub const MAX_FOREIGN: usize = 8;

/// Maximum MessagePack nesting depth (transaction map, asset params / schema
/// maps, application argument arrays)
pub const MAX_DEPTH: usize = 3;

/// Algorand SLIP-0044 coin type
pub const ALGO_COIN_TYPE: u32 = 283;

/// Hardened derivation flag
pub const HARDENED: u32 = 0x8000_0000;

/// Encoded address length (base32 of 32-byte key and 4-byte checksum)
pub const ADDRESS_LEN: usize = 58;

// Every field slot must fit within the working buffer
const_assert!(MAX_NOTE_LEN < MAX_TX_SIZE);
const_assert!(MAX_APP_ARGS * MAX_APP_ARG_LEN < MAX_TX_SIZE);

/// Build the SLIP-0010 derivation path `m/44'/283'/account'/0'/0'`
/// for an account index
pub const fn account_path(account_index: u32) -> [u32; 5] {
    [
        44 | HARDENED,
        ALGO_COIN_TYPE | HARDENED,
        account_index | HARDENED,
        HARDENED,
        HARDENED,
    ]
}
