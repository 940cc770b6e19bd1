//! Fixed-size packets.
//!
//! Every packet is exactly `packet_size` bytes: a 4-byte header followed by
//! the payload region.
//!
//! # Packet Format
//!
//! ```text
//! +-------------------+
//! | header (4)        |  see `header`
//! +-------------------+
//! | annotated chunk   |  head_reserve bytes of chunk head, then chunk data
//! | (variable)        |
//! +-------------------+
//! | stuffing          |  0xFF up to packet_size
//! +-------------------+
//! ```
//!
//! The packet buffer is allocated filled with `STUFFING_BYTE` and the header
//! and chunk are written over it, so stuffing needs no separate pass.

use crate::error::{PacketError, Result};
use crate::header::{PacketHeader, HEADER_SIZE};

/// Packet size of the reference configuration
pub const DEFAULT_PACKET_SIZE: usize = 188;

/// Fill value for unused payload bytes
pub const STUFFING_BYTE: u8 = 0xFF;

/// Sizes derived from a packet size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketLayout {
    packet_size: usize,
}

impl PacketLayout {
    /// Caller guarantees `packet_size > HEADER_SIZE`; `FramingConfig::validate`
    /// enforces it.
    pub fn new(packet_size: usize) -> Self {
        debug_assert!(packet_size > HEADER_SIZE);
        Self { packet_size }
    }

    pub fn packet_size(&self) -> usize {
        self.packet_size
    }

    /// Bytes available after the header.
    pub fn payload_capacity(&self) -> usize {
        self.packet_size - HEADER_SIZE
    }
}

impl Default for PacketLayout {
    fn default() -> Self {
        Self::new(DEFAULT_PACKET_SIZE)
    }
}

/// Build one packet carrying `payload` (an annotated chunk).
///
/// # Errors
/// `PacketError::PayloadOverflow` if `payload` is longer than the payload
/// capacity.
pub fn build_packet(layout: &PacketLayout, header: &PacketHeader, payload: &[u8]) -> Result<Vec<u8>> {
    let capacity = layout.payload_capacity();
    if payload.len() > capacity {
        return Err(PacketError::PayloadOverflow {
            len: payload.len(),
            capacity,
        }
        .into());
    }

    let mut packet = vec![STUFFING_BYTE; layout.packet_size()];
    header.pack(&mut packet[..HEADER_SIZE])?;
    packet[HEADER_SIZE..HEADER_SIZE + payload.len()].copy_from_slice(payload);

    Ok(packet)
}

/// A parsed packet borrowing its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketView<'a> {
    pub header: PacketHeader,
    /// Full payload region, stuffing included
    pub payload: &'a [u8],
}

impl<'a> PacketView<'a> {
    /// Parse a packet of exactly `layout.packet_size()` bytes.
    ///
    /// # Errors
    /// - `PacketError::SizeMismatch` if the length is wrong
    /// - header errors from `PacketHeader::unpack`
    pub fn parse(bytes: &'a [u8], layout: &PacketLayout) -> Result<Self> {
        if bytes.len() != layout.packet_size() {
            return Err(PacketError::SizeMismatch {
                expected: layout.packet_size(),
                actual: bytes.len(),
            }
            .into());
        }

        let header = PacketHeader::unpack(bytes)?;
        Ok(Self {
            header,
            payload: &bytes[HEADER_SIZE..],
        })
    }
}
