//! Packet header: a 4-byte bit-packed record.
//!
//! # Header Format
//!
//! ```text
//!  bit 0        8  9  10 11                      24   26   28     32
//!  +------------+--+--+--+------------------------+----+----+------+
//!  | sync 0x47  |E |S |P | channel id (13)        |SC  |AFC | CC   |
//!  +------------+--+--+--+------------------------+----+----+------+
//! ```
//!
//! - E: error indicator, always 0
//! - S: start-of-payload indicator, always 1
//! - P: priority, always 0
//! - SC: scrambling control, always 0b00
//! - AFC: adaptation-field control, always 0b01 (payload only)
//! - CC: continuity counter, packet index mod 16
//!
//! Fields are written big-endian, MSB-first, through `bitio`. Field widths are
//! constants; their sum is checked against `HEADER_SIZE` at compile time.

use static_assertions::const_assert_eq;

use crate::bitio::{BitReader, BitWriter};
use crate::error::{ConfigError, PacketError, Result};

/// Size of the packet header in bytes
pub const HEADER_SIZE: usize = 4;

/// Sync marker, first byte of every packet
pub const SYNC_BYTE: u8 = 0x47;

const SYNC_BITS: usize = 8;
const ERROR_INDICATOR_BITS: usize = 1;
const PAYLOAD_START_BITS: usize = 1;
const PRIORITY_BITS: usize = 1;
const CHANNEL_ID_BITS: usize = 13;
const SCRAMBLING_BITS: usize = 2;
const ADAPTATION_BITS: usize = 2;
const CONTINUITY_BITS: usize = 4;

const_assert_eq!(
    SYNC_BITS
        + ERROR_INDICATOR_BITS
        + PAYLOAD_START_BITS
        + PRIORITY_BITS
        + CHANNEL_ID_BITS
        + SCRAMBLING_BITS
        + ADAPTATION_BITS
        + CONTINUITY_BITS,
    HEADER_SIZE * 8
);

/// Adaptation-field control value meaning "payload only"
pub const ADAPTATION_PAYLOAD_ONLY: u8 = 0b01;

/// A 13-bit channel identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(u16);

impl ChannelId {
    /// Largest representable channel id (8191)
    pub const MAX: u16 = (1 << CHANNEL_ID_BITS) - 1;

    /// # Errors
    /// `ConfigError::ChannelIdOutOfRange` if `id` needs more than 13 bits.
    pub fn new(id: u16) -> std::result::Result<Self, ConfigError> {
        if id > Self::MAX {
            return Err(ConfigError::ChannelIdOutOfRange {
                channel_id: id as u32,
                max: Self::MAX as u32,
            });
        }
        Ok(Self(id))
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

/// A 4-bit rolling sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContinuityCounter(u8);

impl ContinuityCounter {
    /// Number of distinct counter values
    pub const MODULUS: usize = 1 << CONTINUITY_BITS;

    /// Counter for the packet at `index` within a whole encode.
    pub fn for_index(index: usize) -> Self {
        Self((index % Self::MODULUS) as u8)
    }

    /// The value that should follow this one.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % Self::MODULUS as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// Decoded header fields of one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub error_indicator: bool,
    pub payload_start: bool,
    pub priority: bool,
    pub channel_id: ChannelId,
    pub scrambling: u8,
    pub adaptation_control: u8,
    pub continuity: ContinuityCounter,
}

impl PacketHeader {
    /// The only header shape the packetizer emits: payload only, start flag
    /// set, everything else cleared.
    pub fn payload_only(channel_id: ChannelId, continuity: ContinuityCounter) -> Self {
        Self {
            error_indicator: false,
            payload_start: true,
            priority: false,
            channel_id,
            scrambling: 0b00,
            adaptation_control: ADAPTATION_PAYLOAD_ONLY,
            continuity,
        }
    }

    /// Pack into the first `HEADER_SIZE` bytes of `buf`, overwriting them.
    ///
    /// # Errors
    /// Propagates bit I/O errors if `buf` is shorter than the header or a
    /// field value is wider than its field.
    pub fn pack(&self, buf: &mut [u8]) -> Result<()> {
        let mut writer = BitWriter::new(buf);
        writer.write_bits(SYNC_BYTE as u64, SYNC_BITS)?;
        writer.write_bits(self.error_indicator as u64, ERROR_INDICATOR_BITS)?;
        writer.write_bits(self.payload_start as u64, PAYLOAD_START_BITS)?;
        writer.write_bits(self.priority as u64, PRIORITY_BITS)?;
        writer.write_bits(self.channel_id.get() as u64, CHANNEL_ID_BITS)?;
        writer.write_bits(self.scrambling as u64, SCRAMBLING_BITS)?;
        writer.write_bits(self.adaptation_control as u64, ADAPTATION_BITS)?;
        writer.write_bits(self.continuity.get() as u64, CONTINUITY_BITS)?;
        Ok(())
    }

    /// Unpack from the first `HEADER_SIZE` bytes of `bytes`.
    ///
    /// # Errors
    /// - `PacketError::PacketTooShort` if fewer than `HEADER_SIZE` bytes
    /// - `PacketError::InvalidSync` if the first byte is not `SYNC_BYTE`
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(PacketError::PacketTooShort {
                required: HEADER_SIZE,
                actual: bytes.len(),
            }
            .into());
        }

        let mut reader = BitReader::new(&bytes[..HEADER_SIZE]);
        let sync = reader.read_bits(SYNC_BITS)? as u8;
        if sync != SYNC_BYTE {
            return Err(PacketError::InvalidSync {
                expected: SYNC_BYTE,
                actual: sync,
            }
            .into());
        }

        let error_indicator = reader.read_bit()?;
        let payload_start = reader.read_bit()?;
        let priority = reader.read_bit()?;
        // 13 bits always fit
        let channel_id = ChannelId(reader.read_bits(CHANNEL_ID_BITS)? as u16);
        let scrambling = reader.read_bits(SCRAMBLING_BITS)? as u8;
        let adaptation_control = reader.read_bits(ADAPTATION_BITS)? as u8;
        let continuity = ContinuityCounter(reader.read_bits(CONTINUITY_BITS)? as u8);

        Ok(Self {
            error_indicator,
            payload_start,
            priority,
            channel_id,
            scrambling,
            adaptation_control,
            continuity,
        })
    }
}
