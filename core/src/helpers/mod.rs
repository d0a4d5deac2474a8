// Copyright (c) 2023 The ledger-algo Developers

use core::str::from_utf8;

use sha2::{Digest, Sha512_256};

use crate::consts::ADDRESS_LEN;

/// RFC 4648 base32 alphabet
const BASE32: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Address checksum length (trailing bytes of the key digest)
const CHECKSUM_LEN: usize = 4;

/// Format an Algorand address (unpadded base32 of the public key followed by
/// the last four bytes of its SHA-512/256 digest)
pub fn fmt_address<'a>(public_key: &[u8; 32], buff: &'a mut [u8; ADDRESS_LEN]) -> &'a str {
    let h = Sha512_256::new().chain_update(public_key).finalize();

    let mut d = [0u8; 32 + CHECKSUM_LEN];
    d[..32].copy_from_slice(public_key);
    d[32..].copy_from_slice(&h[h.len() - CHECKSUM_LEN..]);

    let (mut acc, mut bits, mut n) = (0u32, 0, 0);
    for b in d {
        acc = (acc << 8 | b as u32) & 0xfff;
        bits += 8;

        while bits >= 5 {
            bits -= 5;
            buff[n] = BASE32[(acc >> bits) as usize & 0x1f];
            n += 1;
        }
    }

    // Flush remaining bits
    if bits > 0 {
        buff[n] = BASE32[(acc << (5 - bits)) as usize & 0x1f];
        n += 1;
    }

    match from_utf8(&buff[..n]) {
        Ok(v) => v,
        Err(_) => "INVALID_UTF8",
    }
}
