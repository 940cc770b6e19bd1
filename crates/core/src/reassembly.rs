//! Reassembly: ordered containers → original bytes.
//!
//! The caller sorts a group's containers by index before calling `decode`.
//! The reassembler then walks every packet in order:
//!
//! - skip the 4-byte header (checking the sync byte and continuity counter)
//! - read the next `head_reserve` bytes as a `ChunkHead`
//! - fold the rest of the payload (the shard) into the output: `First` starts
//!   a new buffer, `Middle` and `Last` append
//!
//! # Trailing stuffing
//!
//! The final packet of a group is usually not full; the rest of its payload is
//! 0xFF stuffing. The packet format itself records no length, so the shard of
//! each packet is cut to the length carried in its `ChunkHead`. Legacy heads
//! (length 0) keep the whole shard, stuffing included.
//!
//! # Continuity
//!
//! Counter discontinuities are not fatal. Each one is logged and reported in
//! `Reassembly::continuity_gaps`.

use tracing::{debug, warn};

use crate::chunk::{ChunkHead, ChunkRole, HeadConvention};
use crate::config::FramingConfig;
use crate::container::split_container;
use crate::error::{ConfigError, Error, FramingError, PacketError, Result};
use crate::header::ContinuityCounter;
use crate::packet::{PacketLayout, PacketView};

/// A break in the continuity counter sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuityGap {
    /// Index of the packet within the whole group
    pub packet: usize,
    pub expected: u8,
    pub found: u8,
}

/// Result of decoding one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassembly {
    /// Reconstructed input
    pub data: Vec<u8>,
    /// Packets consumed
    pub packets: usize,
    /// Non-fatal counter discontinuities, in packet order
    pub continuity_gaps: Vec<ContinuityGap>,
}

/// Tracks the expected continuity counter across a group.
#[derive(Debug, Default)]
pub struct ContinuityTracker {
    expected: Option<ContinuityCounter>,
}

impl ContinuityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the counter of packet `packet` and return a gap if it is not the
    /// successor of the previous one. The first packet must carry 0.
    pub fn observe(&mut self, packet: usize, counter: ContinuityCounter) -> Option<ContinuityGap> {
        let expected = self.expected.unwrap_or_default();
        self.expected = Some(counter.next());

        (counter != expected).then_some(ContinuityGap {
            packet,
            expected: expected.get(),
            found: counter.get(),
        })
    }
}

/// Decodes groups of containers produced by a `Packetizer` with the standard
/// chunk head.
///
/// Only the length-carrying `ChunkHead` layout is understood, so
/// `head_reserve` must be at least `ChunkHead::LEN` (4). Groups written with a
/// shorter custom head, such as a lone status byte, cannot be decoded here.
/// A 4-byte status-only head with zero length bytes still decodes, keeping the
/// trailing stuffing.
#[derive(Debug, Clone)]
pub struct Reassembler {
    layout: PacketLayout,
    head_reserve: usize,
    convention: HeadConvention,
}

impl Reassembler {
    /// # Errors
    /// - `Error::Config` if any framing parameter is invalid
    /// - `ConfigError::HeadReserveTooSmall` if the reserve cannot hold a
    ///   `ChunkHead`
    pub fn new(config: &FramingConfig) -> Result<Self> {
        config.validate()?;
        if config.head_reserve < ChunkHead::LEN {
            return Err(ConfigError::HeadReserveTooSmall {
                head_reserve: config.head_reserve,
                required: ChunkHead::LEN,
            }
            .into());
        }

        Ok(Self {
            layout: config.layout(),
            head_reserve: config.head_reserve,
            convention: config.convention,
        })
    }

    /// Decode one group. `containers` must already be sorted by group index.
    ///
    /// No partial output is returned on error.
    ///
    /// # Errors
    /// - `FramingError::TruncatedContainer` if a container is not a whole
    ///   number of packets
    /// - `FramingError::InvalidSync` if a packet lacks the sync byte
    /// - `FramingError::UnknownChunkRole` for a head discriminator outside the
    ///   convention
    /// - `FramingError::MissingFirstChunk` if data continues a buffer that was
    ///   never started
    /// - `FramingError::ChunkLengthOverflow` if a head claims more bytes than
    ///   its packet holds
    pub fn decode<C: AsRef<[u8]>>(&self, containers: &[C]) -> Result<Reassembly> {
        let mut output: Option<Vec<u8>> = None;
        let mut continuity = ContinuityTracker::new();
        let mut gaps = Vec::new();
        let mut index = 0usize;

        for (container_index, container) in containers.iter().enumerate() {
            let container = container.as_ref();
            let packets = split_container(container, self.layout.packet_size()).map_err(|len| {
                FramingError::TruncatedContainer {
                    container: container_index,
                    len,
                    packet_size: self.layout.packet_size(),
                }
            })?;

            for raw in packets {
                let packet = self.parse_packet(raw, index)?;

                if let Some(gap) = continuity.observe(index, packet.header.continuity) {
                    warn!(
                        packet = gap.packet,
                        expected = gap.expected,
                        found = gap.found,
                        "continuity counter discontinuity"
                    );
                    gaps.push(gap);
                }

                let (role, shard) = self.split_payload(packet.payload, index)?;
                match role {
                    ChunkRole::First => {
                        if let Some(previous) = output.replace(shard.to_vec()) {
                            warn!(
                                packet = index,
                                discarded_bytes = previous.len(),
                                "first chunk restarted the output buffer"
                            );
                        }
                    }
                    ChunkRole::Middle | ChunkRole::Last => output
                        .as_mut()
                        .ok_or(FramingError::MissingFirstChunk { packet: index })?
                        .extend_from_slice(shard),
                }

                index += 1;
            }
        }

        let data = output.unwrap_or_default();
        debug!(
            containers = containers.len(),
            packets = index,
            output_bytes = data.len(),
            gaps = gaps.len(),
            "decoded group"
        );

        Ok(Reassembly {
            data,
            packets: index,
            continuity_gaps: gaps,
        })
    }

    fn parse_packet<'a>(&self, raw: &'a [u8], index: usize) -> Result<PacketView<'a>> {
        PacketView::parse(raw, &self.layout).map_err(|err| match err {
            Error::Packet(PacketError::InvalidSync { actual, .. }) => {
                FramingError::InvalidSync { packet: index, found: actual }.into()
            }
            other => other,
        })
    }

    /// Split a payload into its chunk role and data shard.
    fn split_payload<'a>(&self, payload: &'a [u8], index: usize) -> Result<(ChunkRole, &'a [u8])> {
        let (head, shard) = payload.split_at(self.head_reserve);
        let head = ChunkHead::decode(head, &self.convention).ok_or(FramingError::UnknownChunkRole {
            packet: index,
            discriminator: head[0],
        })?;

        if head.is_legacy() {
            return Ok((head.role, shard));
        }
        if head.len > shard.len() {
            return Err(FramingError::ChunkLengthOverflow {
                packet: index,
                declared: head.len,
                available: shard.len(),
            }
            .into());
        }
        Ok((head.role, &shard[..head.len]))
    }
}
