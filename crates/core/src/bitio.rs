//! Bit-level access to fixed byte buffers.
//!
//! `BitWriter` and `BitReader` address a borrowed buffer by absolute bit
//! position, MSB-first (bit 0 is the most significant bit of byte 0). This is
//! the big-endian bit order of packet headers.
//!
//! Unlike a streaming writer, `BitWriter` overwrites bits in place: the target
//! buffer may already hold data (packets are allocated pre-filled with stuffing
//! bytes), so every written field clears its bits before setting them.
//!
//! # Example
//! ```
//! use tsframe_core::bitio::{BitReader, BitWriter};
//!
//! let mut buf = [0xFFu8; 2];
//! let mut writer = BitWriter::new(&mut buf);
//! writer.write_bits(0b101, 3).unwrap();
//! writer.write_bits(0, 5).unwrap();
//! assert_eq!(buf[0], 0b1010_0000);
//! assert_eq!(buf[1], 0xFF);
//!
//! let mut reader = BitReader::new(&buf);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! ```

use crate::error::{BitIoError, Result};

/// Writes bit fields MSB-first into a borrowed buffer.
///
/// # Invariants
/// - `position <= buf.len() * 8`
#[derive(Debug)]
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    /// Next bit to write (0 = MSB of first byte)
    position: usize,
}

impl<'a> BitWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, position: 0 }
    }

    /// Write the lowest `count` bits of `value` at the current position.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count > 64
    /// - `BitIoError::ValueTooWide` if `value` has bits set above `count`
    /// - `BitIoError::OutOfBounds` if the field runs past the buffer
    pub fn write_bits(&mut self, value: u64, count: usize) -> Result<()> {
        check_count(count)?;
        if count < 64 && value >> count != 0 {
            return Err(BitIoError::ValueTooWide { value, bits: count }.into());
        }
        self.check_room(count)?;

        let mut remaining = count;
        while remaining > 0 {
            let byte_idx = self.position / 8;
            let bit_offset = self.position % 8;
            let bits_in_byte = 8 - bit_offset;
            let take = remaining.min(bits_in_byte);

            // Top `take` bits of what is left of the value
            let bits = ((value >> (remaining - take)) & low_mask(take)) as u8;
            let shift = bits_in_byte - take;
            let mask = (low_mask(take) as u8) << shift;

            self.buf[byte_idx] = (self.buf[byte_idx] & !mask) | (bits << shift);

            self.position += take;
            remaining -= take;
        }

        Ok(())
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.write_bits(bit as u64, 1)
    }

    /// Current bit position.
    pub fn position(&self) -> usize {
        self.position
    }

    fn check_room(&self, count: usize) -> Result<()> {
        let available = self.buf.len() * 8;
        if self.position + count > available {
            return Err(BitIoError::OutOfBounds {
                position: self.position,
                count,
                available,
            }
            .into());
        }
        Ok(())
    }
}

/// Reads bit fields MSB-first from a borrowed buffer.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Read `count` bits (0-64) as an unsigned value.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count > 64
    /// - `BitIoError::OutOfBounds` if not enough bits remain
    pub fn read_bits(&mut self, count: usize) -> Result<u64> {
        check_count(count)?;
        if count > self.bits_remaining() {
            return Err(BitIoError::OutOfBounds {
                position: self.position,
                count,
                available: self.data.len() * 8,
            }
            .into());
        }

        let mut result = 0u64;
        let mut remaining = count;

        while remaining > 0 {
            let byte = self.data[self.position / 8];
            let bits_in_byte = 8 - self.position % 8;
            let take = remaining.min(bits_in_byte);

            let bits = (byte >> (bits_in_byte - take)) as u64 & low_mask(take);
            result = (result << take) | bits;

            self.position += take;
            remaining -= take;
        }

        Ok(result)
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    pub fn bits_remaining(&self) -> usize {
        self.data.len() * 8 - self.position
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

fn check_count(count: usize) -> Result<()> {
    if count > 64 {
        return Err(BitIoError::InvalidBitCount(count).into());
    }
    Ok(())
}

/// Mask with the lowest `bits` bits set (bits <= 64).
fn low_mask(bits: usize) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}
