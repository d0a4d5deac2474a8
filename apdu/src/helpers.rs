// Copyright (c) 2023 The ledger-algo Developers

/// Encoding helper for optional big-endian account indices.
///
/// An absent index is encoded as an empty payload, the device then
/// falls back to account zero.
pub(crate) mod account {
    use byteorder::{BigEndian, ByteOrder};
    use ledger_proto::ApduError;

    /// Encoded length of a present account index
    pub const LEN: usize = 4;

    pub fn enc(v: &Option<u32>, buff: &mut [u8]) -> Result<usize, ApduError> {
        let v = match v {
            Some(v) => *v,
            None => return Ok(0),
        };

        if buff.len() < LEN {
            return Err(ApduError::InvalidLength);
        }

        BigEndian::write_u32(&mut buff[..LEN], v);

        Ok(LEN)
    }

    pub fn enc_len(v: &Option<u32>) -> Result<usize, ApduError> {
        Ok(match v {
            Some(_) => LEN,
            None => 0,
        })
    }

    /// Decode an account index payload, requiring the buffer to be
    /// either empty or exactly one big-endian `u32`
    pub fn dec(buff: &[u8]) -> Result<(Option<u32>, usize), ApduError> {
        match buff.len() {
            0 => Ok((None, 0)),
            LEN => Ok((Some(BigEndian::read_u32(buff)), LEN)),
            _ => Err(ApduError::InvalidLength),
        }
    }
}

/// Encoding helper for fixed size arrays
pub(crate) mod arr {
    use ledger_proto::ApduError;

    pub fn enc<const N: usize>(d: &[u8; N], buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < d.len() {
            return Err(ApduError::InvalidLength);
        }

        buff[..d.len()].copy_from_slice(&d[..]);

        Ok(d.len())
    }

    pub fn dec<const N: usize>(buff: &[u8]) -> Result<([u8; N], usize), ApduError> {
        if buff.len() < N {
            return Err(ApduError::InvalidLength);
        }

        let mut d = [0u8; N];
        d.copy_from_slice(&buff[..N]);

        Ok((d, N))
    }
}
