//! Chunk heads and the annotator hook.
//!
//! Before packetization every chunk of the input passes through a
//! `ChunkAnnotator`, the only stage that sees a chunk's position in the whole
//! input. The standard annotator, `StandardHead`, prefixes each chunk with a
//! 4-byte `ChunkHead`:
//!
//! ```text
//! +-----------+----------------------------+
//! | role (1)  | chunk length (3, BE)       |
//! +-----------+----------------------------+
//! ```
//!
//! The role byte tells the reassembler whether to start a new output buffer
//! or append to the current one. Which byte means which role is a
//! `HeadConvention` shared by both sides.
//!
//! The length field lets the reassembler drop the 0xFF stuffing that fills the
//! rest of the final packet. Without it the stuffing is indistinguishable from
//! data. A length of zero marks a legacy head (role byte followed by three zero
//! bytes) whose shard is taken whole, stuffing included.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Position of a chunk within its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkRole {
    /// Starts a new output buffer
    First,
    /// Appends to the current output buffer
    Middle,
    /// Appends to the current output buffer and ends the input
    Last,
}

impl ChunkRole {
    /// Role of chunk `index` out of `total`.
    ///
    /// Index 0 is always `First`, even when it is also the only chunk.
    pub fn for_position(index: usize, total: usize) -> Self {
        if index == 0 {
            ChunkRole::First
        } else if index + 1 == total {
            ChunkRole::Last
        } else {
            ChunkRole::Middle
        }
    }
}

/// Discriminator bytes for each chunk role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadConvention {
    pub first: u8,
    pub middle: u8,
    pub last: u8,
}

impl Default for HeadConvention {
    fn default() -> Self {
        Self {
            first: 0x00,
            middle: 0x01,
            last: 0x02,
        }
    }
}

impl HeadConvention {
    /// # Errors
    /// `ConfigError::DuplicateDiscriminator` if two roles share a byte.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first == self.middle || self.first == self.last {
            return Err(ConfigError::DuplicateDiscriminator(self.first));
        }
        if self.middle == self.last {
            return Err(ConfigError::DuplicateDiscriminator(self.middle));
        }
        Ok(())
    }

    pub fn byte_for(&self, role: ChunkRole) -> u8 {
        match role {
            ChunkRole::First => self.first,
            ChunkRole::Middle => self.middle,
            ChunkRole::Last => self.last,
        }
    }

    pub fn role_for(&self, byte: u8) -> Option<ChunkRole> {
        if byte == self.first {
            Some(ChunkRole::First)
        } else if byte == self.middle {
            Some(ChunkRole::Middle)
        } else if byte == self.last {
            Some(ChunkRole::Last)
        } else {
            None
        }
    }
}

/// Metadata prefixed to a chunk by `StandardHead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHead {
    pub role: ChunkRole,
    /// True chunk length; 0 for legacy heads
    pub len: usize,
}

impl ChunkHead {
    /// Encoded size in bytes
    pub const LEN: usize = 4;

    /// Largest chunk length the 24-bit field can describe
    pub const MAX_CHUNK_LEN: usize = 0xFF_FFFF;

    pub fn encode(&self, convention: &HeadConvention) -> [u8; Self::LEN] {
        let len = (self.len as u32).to_be_bytes();
        [convention.byte_for(self.role), len[1], len[2], len[3]]
    }

    /// Parse a head from the front of `bytes`.
    ///
    /// Returns `None` if `bytes` is shorter than `LEN` or the role byte is not
    /// part of `convention`.
    pub fn decode(bytes: &[u8], convention: &HeadConvention) -> Option<Self> {
        let head: &[u8; Self::LEN] = bytes.get(..Self::LEN)?.try_into().ok()?;
        let role = convention.role_for(head[0])?;
        let len = u32::from_be_bytes([0, head[1], head[2], head[3]]) as usize;
        Some(Self { role, len })
    }

    /// Whether the head predates the length field.
    pub fn is_legacy(&self) -> bool {
        self.len == 0
    }
}

/// Transforms a chunk before it is packetized.
///
/// Implementations must be pure: the same `(chunk, index, total)` always yields
/// the same bytes. The output should be exactly `head_reserve` bytes longer
/// than `chunk`; a shorter output shifts payload alignment and is not detected.
///
/// Implemented for closures of the same shape.
pub trait ChunkAnnotator: Send + Sync {
    fn annotate(&self, chunk: &[u8], index: usize, total: usize) -> Vec<u8>;
}

impl<F> ChunkAnnotator for F
where
    F: Fn(&[u8], usize, usize) -> Vec<u8> + Send + Sync,
{
    fn annotate(&self, chunk: &[u8], index: usize, total: usize) -> Vec<u8> {
        self(chunk, index, total)
    }
}

/// Passes chunks through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAnnotator;

impl ChunkAnnotator for IdentityAnnotator {
    fn annotate(&self, chunk: &[u8], _index: usize, _total: usize) -> Vec<u8> {
        chunk.to_vec()
    }
}

/// Prefixes each chunk with a `ChunkHead`, zero-padded to `head_reserve`.
#[derive(Debug, Clone, Copy)]
pub struct StandardHead {
    convention: HeadConvention,
    head_reserve: usize,
}

impl StandardHead {
    /// # Errors
    /// - `ConfigError::HeadReserveTooSmall` if `head_reserve < ChunkHead::LEN`
    /// - `ConfigError::DuplicateDiscriminator` from the convention
    pub fn new(convention: HeadConvention, head_reserve: usize) -> Result<Self, ConfigError> {
        if head_reserve < ChunkHead::LEN {
            return Err(ConfigError::HeadReserveTooSmall {
                head_reserve,
                required: ChunkHead::LEN,
            });
        }
        convention.validate()?;
        Ok(Self {
            convention,
            head_reserve,
        })
    }
}

impl ChunkAnnotator for StandardHead {
    fn annotate(&self, chunk: &[u8], index: usize, total: usize) -> Vec<u8> {
        let head = ChunkHead {
            role: ChunkRole::for_position(index, total),
            len: chunk.len(),
        };

        let mut out = Vec::with_capacity(self.head_reserve + chunk.len());
        out.extend_from_slice(&head.encode(&self.convention));
        out.resize(self.head_reserve, 0);
        out.extend_from_slice(chunk);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_by_position() {
        assert_eq!(ChunkRole::for_position(0, 1), ChunkRole::First);
        assert_eq!(ChunkRole::for_position(0, 3), ChunkRole::First);
        assert_eq!(ChunkRole::for_position(1, 3), ChunkRole::Middle);
        assert_eq!(ChunkRole::for_position(2, 3), ChunkRole::Last);
    }

    #[test]
    fn test_head_encoding() {
        let head = ChunkHead {
            role: ChunkRole::Last,
            len: 20,
        };
        let bytes = head.encode(&HeadConvention::default());
        assert_eq!(bytes, [0x02, 0x00, 0x00, 0x14]);
        assert_eq!(ChunkHead::decode(&bytes, &HeadConvention::default()), Some(head));
    }

    #[test]
    fn test_legacy_head() {
        let head = ChunkHead::decode(&[0x01, 0, 0, 0], &HeadConvention::default()).unwrap();
        assert_eq!(head.role, ChunkRole::Middle);
        assert!(head.is_legacy());
    }

    #[test]
    fn test_unknown_role_byte() {
        assert_eq!(ChunkHead::decode(&[0x07, 0, 0, 1], &HeadConvention::default()), None);
        assert_eq!(ChunkHead::decode(&[0x00, 0], &HeadConvention::default()), None);
    }

    #[test]
    fn test_custom_convention() {
        let convention = HeadConvention {
            first: b'F',
            middle: b'M',
            last: b'L',
        };
        assert_eq!(convention.role_for(b'M'), Some(ChunkRole::Middle));
        assert_eq!(convention.role_for(0x00), None);
        assert_eq!(convention.byte_for(ChunkRole::Last), b'L');
    }

    #[test]
    fn test_duplicate_discriminator() {
        let convention = HeadConvention {
            first: 0,
            middle: 1,
            last: 1,
        };
        assert_eq!(convention.validate(), Err(ConfigError::DuplicateDiscriminator(1)));
    }

    #[test]
    fn test_standard_head_pads_reserve() {
        let annotator = StandardHead::new(HeadConvention::default(), 6).unwrap();
        let out = annotator.annotate(&[0xAA, 0xBB], 1, 3);
        assert_eq!(out, vec![0x01, 0, 0, 2, 0, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn test_standard_head_rejects_small_reserve() {
        assert_eq!(
            StandardHead::new(HeadConvention::default(), 2).unwrap_err(),
            ConfigError::HeadReserveTooSmall {
                head_reserve: 2,
                required: 4
            }
        );
    }

    #[test]
    fn test_closure_annotator() {
        let tag = |chunk: &[u8], index: usize, _total: usize| {
            let mut out = vec![index as u8];
            out.extend_from_slice(chunk);
            out
        };
        assert_eq!(tag.annotate(&[9], 3, 4), vec![3, 9]);
    }
}
