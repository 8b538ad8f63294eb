//! # Memory segments
//! The machine uses two flat byte segments: instruction memory, read one 16-bit
//! word at a time by the fetch stage, and data memory, which holds loaded data
//! and the downward-growing stack.
//!
//! Anything that can be viewed as a byte slice can be used as a segment: arrays,
//! vectors, boxed slices, etc. Every access computed from guest values is bounds
//! checked and reported as a [`FaultKind`] instead of panicking.

use std::{
    collections::TryReserveError,
    io::{self, Read},
};

use crate::error::FaultKind;

pub trait SegmentMemory {
    // Required methods
    fn bytes(&self) -> &[u8];
    fn bytes_mut(&mut self) -> &mut [u8];

    // Provided methods
    /// Size of the segment in bytes.
    fn capacity(&self) -> usize {
        self.bytes().len()
    }

    /// Returns `len` bytes starting at `offset`, or a fault if any of them lies
    /// outside of the segment.
    fn range(&self, offset: u64, len: u64) -> Result<&[u8], FaultKind> {
        let bytes = self.bytes();
        let (start, end) = checked_bounds(offset, len, bytes.len())?;
        Ok(&bytes[start..end])
    }
    fn range_mut(&mut self, offset: u64, len: u64) -> Result<&mut [u8], FaultKind> {
        let bytes = self.bytes_mut();
        let (start, end) = checked_bounds(offset, len, bytes.len())?;
        Ok(&mut bytes[start..end])
    }

    /// Reads a little endian 64-bit word at a byte offset.
    fn read_u64(&self, offset: u64) -> Result<u64, FaultKind> {
        let mut word = [0; 8];
        word.copy_from_slice(self.range(offset, 8)?);
        Ok(u64::from_le_bytes(word))
    }
    /// Writes a little endian 64-bit word at a byte offset.
    fn write_u64(&mut self, offset: u64, value: u64) -> Result<(), FaultKind> {
        self.range_mut(offset, 8)?
            .copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Reads the instruction word at a *word* index, `None` past the end of the segment.
    fn read_word(&self, index: u64) -> Option<u16> {
        let offset = index.checked_mul(2)?;
        let [lsb, msb] = self.range(offset, 2).ok()? else {
            return None;
        };
        Some(u16::from_le_bytes([*lsb, *msb]))
    }

    /// Fills the segment from a reader, starting at offset 0.
    ///
    /// Reading stops at the end of the stream or when the segment is full, whichever
    /// comes first; extra input is left unread. Bytes past the loaded image are not
    /// touched, so a zeroed segment stays zero-filled after the image.
    ///
    /// Returns the number of bytes loaded.
    fn load<R: Read>(&mut self, mut reader: R) -> io::Result<usize> {
        let buffer = self.bytes_mut();
        let mut loaded = 0;
        while loaded < buffer.len() {
            match reader.read(&mut buffer[loaded..]) {
                Ok(0) => break,
                Ok(n) => loaded += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        log::debug!("loaded {loaded} bytes into a {} byte segment", buffer.len());
        Ok(loaded)
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]> + ?Sized> SegmentMemory for T {
    fn bytes(&self) -> &[u8] {
        self.as_ref()
    }
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.as_mut()
    }
}

/// Turns a guest `(offset, len)` pair into slice bounds.
fn checked_bounds(offset: u64, len: u64, size: usize) -> Result<(usize, usize), FaultKind> {
    let fault = FaultKind::DataOutOfBounds { offset, len, size };
    let end = offset.checked_add(len).ok_or(fault)?;
    if end > size as u64 {
        return Err(fault);
    }
    Ok((offset as usize, end as usize))
}

/// Allocates a zero-initialized segment of `size` bytes, failing instead of
/// aborting when the allocation cannot be made.
pub fn zeroed(size: usize) -> Result<Vec<u8>, TryReserveError> {
    let mut segment = Vec::new();
    segment.try_reserve_exact(size)?;
    segment.resize(size, 0);
    Ok(segment)
}
