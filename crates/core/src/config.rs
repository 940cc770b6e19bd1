//! Framing parameters.
//!
//! Encode and decode of the same group must use the same values. Resolution
//! order: explicit file → `$TSFRAME_CONFIG` → defaults. The app applies
//! command-line overrides on top.
//!
//! ```toml
//! channel_id = 48
//! head_reserve = 4
//! packet_size = 188
//! container_size_cap = 65536
//!
//! [convention]
//! first = 0
//! middle = 1
//! last = 2
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkHead, HeadConvention};
use crate::container::{max_packets_per_container, DEFAULT_CONTAINER_SIZE_CAP};
use crate::error::{ConfigError, Error, Result};
use crate::header::{ChannelId, HEADER_SIZE};
use crate::packet::{PacketLayout, DEFAULT_PACKET_SIZE};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "TSFRAME_CONFIG";

/// Channel id of the reference configuration
pub const DEFAULT_CHANNEL_ID: u16 = 0x30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// 13-bit channel identifier written into every packet
    pub channel_id: u16,
    /// Bytes reserved at the front of every chunk for its head
    pub head_reserve: usize,
    /// Size of every packet, header included
    pub packet_size: usize,
    /// Upper bound on container size
    pub container_size_cap: usize,
    /// Chunk head role discriminators
    pub convention: HeadConvention,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            channel_id: DEFAULT_CHANNEL_ID,
            head_reserve: ChunkHead::LEN,
            packet_size: DEFAULT_PACKET_SIZE,
            container_size_cap: DEFAULT_CONTAINER_SIZE_CAP,
            convention: HeadConvention::default(),
        }
    }
}

impl FramingConfig {
    /// Load from `path`, else from `$TSFRAME_CONFIG`, else defaults.
    ///
    /// An explicit path must exist; a path from the environment that does not
    /// exist falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match std::env::var(CONFIG_ENV).map(PathBuf::from) {
                Ok(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every parameter. Called by the packetizer and reassembler
    /// constructors, before any work.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        ChannelId::new(self.channel_id)?;
        self.convention.validate()?;

        // Header, reserved head, and at least one data byte
        let required = (HEADER_SIZE + 1).saturating_add(self.head_reserve);
        if self.packet_size < required {
            return Err(ConfigError::PacketTooSmall {
                packet_size: self.packet_size,
                required,
            });
        }

        let max = (HEADER_SIZE + ChunkHead::MAX_CHUNK_LEN).saturating_add(self.head_reserve);
        if self.packet_size > max {
            return Err(ConfigError::PacketTooLarge {
                packet_size: self.packet_size,
                max,
            });
        }

        if self.container_size_cap < self.packet_size {
            return Err(ConfigError::ContainerCapTooSmall {
                cap: self.container_size_cap,
                packet_size: self.packet_size,
            });
        }

        Ok(())
    }

    pub fn layout(&self) -> PacketLayout {
        PacketLayout::new(self.packet_size)
    }

    /// Raw input bytes per chunk: payload capacity minus the head reserve.
    pub fn chunk_size(&self) -> usize {
        self.layout().payload_capacity() - self.head_reserve
    }

    pub fn max_packets_per_container(&self) -> usize {
        max_packets_per_container(self.container_size_cap, self.packet_size)
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Framing ===");
        println!("Channel id: {:#06x}", self.channel_id);
        println!("Packet size: {} bytes", self.packet_size);
        println!("Head reserve: {} bytes", self.head_reserve);
        println!("Chunk size: {} bytes", self.chunk_size());
        println!(
            "Container cap: {} bytes ({} packets)",
            self.container_size_cap,
            self.max_packets_per_container()
        );
        println!(
            "Head convention: first={:#04x} middle={:#04x} last={:#04x}",
            self.convention.first, self.convention.middle, self.convention.last
        );
        println!();
    }
}
