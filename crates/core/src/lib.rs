//! tsframe-core: split bytes into transport-stream style packets and back.
//!
//! An input is cut into chunks, each chunk is annotated with a small head and
//! written into a fixed-size packet (188 bytes by default) behind a 4-byte
//! bit-packed header, and packets are concatenated into bounded-size
//! containers (64 KiB by default). Reassembly walks the containers in order and
//! folds the chunks back together.
//!
//! # Architecture
//!
//! - `bitio`: MSB-first bit access to fixed buffers
//! - `header`: the bit-packed packet header
//! - `packet`: fixed-size packet layout, building and parsing
//! - `chunk`: chunk heads, roles, and the annotator hook
//! - `container`: grouping packets into containers and splitting them again
//! - `config`: framing parameters, shared by both directions
//! - `packetizer`: input bytes → containers
//! - `reassembly`: containers → input bytes
//! - `metrics`: counters for encode/decode runs
//!
//! # Example
//! ```
//! use tsframe_core::{FramingConfig, Packetizer, Reassembler};
//!
//! let config = FramingConfig::default();
//! let input = vec![0xAB; 200];
//!
//! let containers = Packetizer::standard(&config)?.encode(&input)?;
//! assert_eq!(containers.len(), 1);
//! assert_eq!(containers[0].len(), 376);
//!
//! let output = Reassembler::new(&config)?.decode(&containers)?;
//! assert_eq!(output.data, input);
//! # Ok::<(), tsframe_core::Error>(())
//! ```

pub mod bitio;
pub mod chunk;
pub mod config;
pub mod container;
pub mod error;
pub mod header;
pub mod metrics;
pub mod packet;
pub mod packetizer;
pub mod reassembly;

// Re-export commonly used types
pub use chunk::{ChunkAnnotator, ChunkHead, ChunkRole, HeadConvention, IdentityAnnotator, StandardHead};
pub use config::FramingConfig;
pub use error::{ConfigError, Error, FramingError, PacketError, Result};
pub use metrics::Metrics;
pub use packetizer::Packetizer;
pub use reassembly::{ContinuityGap, Reassembler, Reassembly};
