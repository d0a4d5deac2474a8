// Copyright (c) 2023 The ledger-algo Developers

use heapless::Vec;
use zeroize::Zeroize;

/// Chunk would exceed the working buffer capacity
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Overflow;

/// Fixed capacity reassembly buffer for transaction chunks
pub struct WorkingBuffer<const N: usize> {
    buff: Vec<u8, N>,
}

impl<const N: usize> WorkingBuffer<N> {
    /// Create a new (empty) working buffer
    pub const fn new() -> Self {
        Self { buff: Vec::new() }
    }

    /// Append a chunk, failing without modification where this
    /// would exceed the buffer capacity
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), Overflow> {
        if chunk.len() > self.remaining() {
            return Err(Overflow);
        }

        self.buff.extend_from_slice(chunk).map_err(|_| Overflow)
    }

    /// Current write offset (number of valid bytes)
    pub fn offset(&self) -> usize {
        self.buff.len()
    }

    /// Buffer capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Remaining capacity
    pub fn remaining(&self) -> usize {
        N - self.buff.len()
    }

    /// Valid buffer contents
    pub fn as_slice(&self) -> &[u8] {
        &self.buff
    }

    /// Clear (and zeroize) buffer contents
    pub fn reset(&mut self) {
        self.buff.as_mut_slice().zeroize();
        self.buff.clear();
    }
}

impl<const N: usize> Default for WorkingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Drop for WorkingBuffer<N> {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn append_tracks_offset() {
        let mut b = WorkingBuffer::<8>::new();

        assert_eq!(b.append(&[1, 2, 3]), Ok(()));
        assert_eq!(b.offset(), 3);

        assert_eq!(b.append(&[4, 5]), Ok(()));
        assert_eq!(b.offset(), 5);
        assert_eq!(b.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn append_fills_exactly() {
        let mut b = WorkingBuffer::<4>::new();

        assert_eq!(b.append(&[0xaa; 4]), Ok(()));
        assert_eq!(b.remaining(), 0);

        // Empty chunks are always accepted
        assert_eq!(b.append(&[]), Ok(()));
    }

    #[test]
    fn append_overflow_writes_nothing() {
        let mut b = WorkingBuffer::<8>::new();
        b.append(&[1; 6]).unwrap();

        assert_eq!(b.append(&[2; 3]), Err(Overflow));
        assert_eq!(b.offset(), 6);
        assert_eq!(b.as_slice(), &[1; 6]);
    }

    #[test]
    fn reset_clears() {
        let mut b = WorkingBuffer::<8>::new();
        b.append(&[1; 8]).unwrap();

        b.reset();
        assert_eq!(b.offset(), 0);
        assert_eq!(b.append(&[3; 8]), Ok(()));
    }
}
