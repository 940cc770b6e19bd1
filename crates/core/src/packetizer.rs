//! Packetizer: input bytes → ordered containers.
//!
//! # Algorithm
//!
//! 1. Slice the input into chunks of `chunk_size = packet_size - 4 - head_reserve`
//!    bytes; only the last chunk may be shorter.
//! 2. Pass every chunk through the annotator, in index order.
//! 3. Build one packet per annotated chunk, continuity counter = index mod 16.
//! 4. Concatenate packets into containers of at most
//!    `floor(container_size_cap / packet_size)` packets.
//!
//! Steps 1-3 are independent per chunk, so `encode_parallel` spreads them over
//! worker threads. Step 4 always runs in order.

use tracing::debug;

use crate::chunk::{ChunkAnnotator, IdentityAnnotator, StandardHead};
use crate::config::FramingConfig;
use crate::container::pack_containers;
use crate::error::{ConfigError, Error, Result};
use crate::header::{ChannelId, ContinuityCounter, PacketHeader};
use crate::packet::{build_packet, PacketLayout};

/// Encodes byte sequences into containers.
///
/// Construction validates the configuration; encoding itself only fails when
/// the annotator breaks its contract by outgrowing the payload region.
#[derive(Debug)]
pub struct Packetizer<A = IdentityAnnotator> {
    channel_id: ChannelId,
    layout: PacketLayout,
    chunk_size: usize,
    max_packets: usize,
    annotator: A,
}

impl Packetizer<IdentityAnnotator> {
    /// Packetizer that copies chunks verbatim.
    pub fn new(config: &FramingConfig) -> Result<Self> {
        Self::with_annotator(config, IdentityAnnotator)
    }
}

impl Packetizer<StandardHead> {
    /// Packetizer that prefixes every chunk with a `ChunkHead`, so the
    /// `Reassembler` can restore the input exactly.
    pub fn standard(config: &FramingConfig) -> Result<Self> {
        let annotator = StandardHead::new(config.convention, config.head_reserve)?;
        Self::with_annotator(config, annotator)
    }
}

impl<A: ChunkAnnotator> Packetizer<A> {
    /// # Errors
    /// `Error::Config` if any framing parameter is invalid.
    pub fn with_annotator(config: &FramingConfig, annotator: A) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            channel_id: ChannelId::new(config.channel_id)?,
            layout: config.layout(),
            chunk_size: config.chunk_size(),
            max_packets: config.max_packets_per_container(),
            annotator,
        })
    }

    /// Raw input bytes carried by each packet.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks (and packets) `input_len` bytes will produce.
    pub fn chunk_count(&self, input_len: usize) -> usize {
        input_len.div_ceil(self.chunk_size)
    }

    /// Encode `input` into ordered containers.
    ///
    /// Empty input yields no containers.
    ///
    /// # Errors
    /// `PacketError::PayloadOverflow` if the annotator returns more bytes than
    /// a packet can carry.
    pub fn encode(&self, input: &[u8]) -> Result<Vec<Vec<u8>>> {
        let packets = self.packetize(input)?;
        Ok(self.finish(input.len(), packets))
    }

    /// Steps 1-3 only: the ordered packet sequence.
    pub fn packetize(&self, input: &[u8]) -> Result<Vec<Vec<u8>>> {
        let total = self.chunk_count(input.len());
        input
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(index, chunk)| self.build(chunk, index, total))
            .collect()
    }

    /// Same output as `encode`, with packets built on `workers` threads.
    ///
    /// # Errors
    /// - `ConfigError::NoWorkers` if `workers == 0`
    /// - `Error::Worker` if a worker thread panics
    /// - any error `encode` can return
    pub fn encode_parallel(&self, input: &[u8], workers: usize) -> Result<Vec<Vec<u8>>> {
        if workers == 0 {
            return Err(ConfigError::NoWorkers.into());
        }

        let chunks: Vec<&[u8]> = input.chunks(self.chunk_size).collect();
        let total = chunks.len();
        if workers == 1 || total < 2 {
            return self.encode(input);
        }

        let per_worker = (total + workers - 1) / workers;

        let batches = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = chunks
                .chunks(per_worker)
                .enumerate()
                .map(|(worker, batch)| {
                    let first_index = worker * per_worker;
                    scope.spawn(move |_| {
                        batch
                            .iter()
                            .enumerate()
                            .map(|(offset, chunk)| self.build(chunk, first_index + offset, total))
                            .collect::<Result<Vec<_>>>()
                    })
                })
                .collect();

            // Joined in spawn order, so batches stay in chunk order
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| Error::Worker("encode worker panicked".into()))
                        .and_then(|batch| batch)
                })
                .collect::<Result<Vec<_>>>()
        })
        .map_err(|_| Error::Worker("encode scope panicked".into()))??;

        let packets: Vec<Vec<u8>> = batches.into_iter().flatten().collect();
        Ok(self.finish(input.len(), packets))
    }

    fn build(&self, chunk: &[u8], index: usize, total: usize) -> Result<Vec<u8>> {
        let annotated = self.annotator.annotate(chunk, index, total);
        let header = PacketHeader::payload_only(self.channel_id, ContinuityCounter::for_index(index));
        build_packet(&self.layout, &header, &annotated)
    }

    fn finish(&self, input_len: usize, packets: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
        let containers = pack_containers(&packets, self.max_packets);
        debug!(
            input_bytes = input_len,
            packets = packets.len(),
            containers = containers.len(),
            channel_id = self.channel_id.get(),
            "encoded input"
        );
        containers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PacketError;
    use crate::header::HEADER_SIZE;
    use crate::packet::STUFFING_BYTE;

    fn small_config() -> FramingConfig {
        // 16-byte packets, 8 data bytes per chunk, 3 packets per container
        FramingConfig {
            packet_size: 16,
            container_size_cap: 50,
            ..FramingConfig::default()
        }
    }

    #[test]
    fn test_empty_input() {
        let packetizer = Packetizer::standard(&FramingConfig::default()).unwrap();
        assert!(packetizer.encode(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_one_byte_input() {
        let packetizer = Packetizer::standard(&FramingConfig::default()).unwrap();
        let containers = packetizer.encode(&[0x5A]).unwrap();

        assert_eq!(containers.len(), 1);
        let packet = &containers[0];
        assert_eq!(packet.len(), 188);
        assert_eq!(&packet[..HEADER_SIZE], &[0x47, 0x40, 0x30, 0x10]);
        assert_eq!(&packet[4..9], &[0x00, 0, 0, 1, 0x5A]);
        assert!(packet[9..].iter().all(|&b| b == STUFFING_BYTE));
    }

    #[test]
    fn test_chunk_boundaries() {
        let packetizer = Packetizer::standard(&small_config()).unwrap();
        assert_eq!(packetizer.chunk_size(), 8);

        let input: Vec<u8> = (0..20).collect();
        let packets = packetizer.packetize(&input).unwrap();

        assert_eq!(packets.len(), 3);
        // first chunk: role 0, len 8
        assert_eq!(&packets[0][4..8], &[0, 0, 0, 8]);
        assert_eq!(&packets[0][8..16], &input[0..8]);
        // middle chunk
        assert_eq!(&packets[1][4..8], &[1, 0, 0, 8]);
        // last chunk carries 4 bytes then stuffing
        assert_eq!(&packets[2][4..8], &[2, 0, 0, 4]);
        assert_eq!(&packets[2][8..12], &input[16..20]);
        assert_eq!(&packets[2][12..], &[STUFFING_BYTE; 4]);
    }

    #[test]
    fn test_containers_split_at_cap() {
        let packetizer = Packetizer::standard(&small_config()).unwrap();
        let input = vec![7u8; 8 * 7];
        let containers = packetizer.encode(&input).unwrap();

        let sizes: Vec<usize> = containers.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![48, 48, 16]);
    }

    #[test]
    fn test_identity_annotator_fills_payload() {
        let config = FramingConfig {
            head_reserve: 0,
            ..small_config()
        };
        let packetizer = Packetizer::new(&config).unwrap();
        assert_eq!(packetizer.chunk_size(), 12);

        let packets = packetizer.packetize(&[1u8; 13]).unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(&packets[0][4..], &[1u8; 12]);
        assert_eq!(packets[1][4], 1);
    }

    #[test]
    fn test_oversized_annotation() {
        let greedy = |chunk: &[u8], _index: usize, _total: usize| {
            let mut out = vec![0u8; 64];
            out.extend_from_slice(chunk);
            out
        };
        let packetizer = Packetizer::with_annotator(&small_config(), greedy).unwrap();

        assert!(matches!(
            packetizer.encode(&[1, 2, 3]),
            Err(Error::Packet(PacketError::PayloadOverflow { capacity: 12, .. }))
        ));
    }

    #[test]
    fn test_invalid_channel_fails_before_work() {
        let config = FramingConfig {
            channel_id: 9000,
            ..FramingConfig::default()
        };
        assert!(matches!(
            Packetizer::standard(&config),
            Err(Error::Config(ConfigError::ChannelIdOutOfRange { channel_id: 9000, .. }))
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let packetizer = Packetizer::standard(&small_config()).unwrap();
        let input: Vec<u8> = (0..1000u32).map(|i| (i * 31 % 251) as u8).collect();

        let sequential = packetizer.encode(&input).unwrap();
        for workers in [1, 2, 3, 8, 200] {
            assert_eq!(packetizer.encode_parallel(&input, workers).unwrap(), sequential);
        }
    }

    #[test]
    fn test_chunk_count_near_usize_max() {
        let packetizer = Packetizer::standard(&small_config()).unwrap();
        assert_eq!(packetizer.chunk_count(0), 0);
        assert_eq!(packetizer.chunk_count(9), 2);
        assert_eq!(packetizer.chunk_count(usize::MAX), usize::MAX / 8 + 1);
    }

    #[test]
    fn test_parallel_zero_workers() {
        let packetizer = Packetizer::standard(&small_config()).unwrap();
        assert!(matches!(
            packetizer.encode_parallel(&[1], 0),
            Err(Error::Config(ConfigError::NoWorkers))
        ));
    }
}
