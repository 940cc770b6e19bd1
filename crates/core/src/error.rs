//! Error types for the tsframe codec.
//!
//! All operations return structured errors rather than panicking. Every error
//! is deterministic: the same input and configuration always fail the same way.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all operations in the codec.
///
/// Each variant corresponds to a specific failure domain:
/// - Bit I/O: packing or unpacking header bit fields
/// - Packet: building or parsing a single fixed-size packet
/// - Framing: a container or chunk head that cannot be reassembled
/// - Config: invalid framing parameters, rejected before any work is done
/// - I/O and config file parsing
#[derive(Debug, Error)]
pub enum Error {
    /// Bit-field packing failed (e.g., value wider than its field)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// A single packet could not be built or parsed
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),

    /// A group of containers could not be reassembled
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Framing parameters are invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be read as TOML
    #[error("failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Config could not be rendered as TOML
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// A parallel encode worker panicked
    #[error("worker error: {0}")]
    Worker(String),
}

/// Bit-level I/O errors.
#[derive(Debug, Error)]
pub enum BitIoError {
    /// Attempted to read or write past the end of the buffer
    #[error("bit position {position} + {count} bits exceeds buffer of {available} bits")]
    OutOfBounds {
        position: usize,
        count: usize,
        available: usize,
    },

    /// Invalid bit count (more than 64 bits)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),

    /// Value does not fit in the requested number of bits
    #[error("value {value:#x} does not fit in {bits} bits")]
    ValueTooWide { value: u64, bits: usize },
}

/// Packet errors.
#[derive(Debug, Error)]
pub enum PacketError {
    /// Packet is too short to contain a header
    #[error("packet too short: need at least {required} bytes, got {actual}")]
    PacketTooShort { required: usize, actual: usize },

    /// Packet length differs from the configured packet size
    #[error("packet size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// First byte is not the sync marker
    #[error("invalid sync byte: expected {expected:#04x}, got {actual:#04x}")]
    InvalidSync { expected: u8, actual: u8 },

    /// Annotated chunk does not fit in the payload region
    #[error("annotated chunk of {len} bytes exceeds payload capacity {capacity}")]
    PayloadOverflow { len: usize, capacity: usize },
}

/// Reassembly errors. Any of these fails the whole group.
#[derive(Debug, Error)]
pub enum FramingError {
    /// Container length is not a whole number of packets
    #[error("container {container} is {len} bytes, not a multiple of packet size {packet_size}")]
    TruncatedContainer {
        container: usize,
        len: usize,
        packet_size: usize,
    },

    /// Packet does not start with the sync marker
    #[error("packet {packet}: invalid sync byte {found:#04x}")]
    InvalidSync { packet: usize, found: u8 },

    /// Chunk head carries a discriminator outside the head convention
    #[error("packet {packet}: unknown chunk role discriminator {discriminator:#04x}")]
    UnknownChunkRole { packet: usize, discriminator: u8 },

    /// A middle or last chunk arrived before any first chunk
    #[error("packet {packet}: continuation chunk without a preceding first chunk")]
    MissingFirstChunk { packet: usize },

    /// Chunk head declares more data than the packet carries
    #[error("packet {packet}: head declares {declared} bytes but only {available} are present")]
    ChunkLengthOverflow {
        packet: usize,
        declared: usize,
        available: usize,
    },
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Channel identifier does not fit in its 13-bit field
    #[error("channel id {channel_id} out of range (max {max})")]
    ChannelIdOutOfRange { channel_id: u32, max: u32 },

    /// Packet cannot hold the header, the chunk head and at least one data byte
    #[error("packet size {packet_size} too small: need at least {required} bytes")]
    PacketTooSmall { packet_size: usize, required: usize },

    /// Packet payload would not be describable by the standard chunk head
    #[error("packet size {packet_size} too large (max {max})")]
    PacketTooLarge { packet_size: usize, max: usize },

    /// Container cap cannot hold a single packet
    #[error("container size cap {cap} smaller than packet size {packet_size}")]
    ContainerCapTooSmall { cap: usize, packet_size: usize },

    /// Two chunk roles share a discriminator byte
    #[error("chunk role discriminator {0:#04x} used more than once")]
    DuplicateDiscriminator(u8),

    /// Head reserve cannot hold the standard chunk head
    #[error("head reserve {head_reserve} smaller than chunk head of {required} bytes")]
    HeadReserveTooSmall { head_reserve: usize, required: usize },

    /// Worker count of zero
    #[error("worker count must be at least 1")]
    NoWorkers,
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
