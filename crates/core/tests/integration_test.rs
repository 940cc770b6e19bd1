//! Integration tests for the full codec: input -> packetize -> containers ->
//! reassemble -> output, with verification that output matches input.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use tsframe_core::{
    header::{PacketHeader, HEADER_SIZE, SYNC_BYTE},
    packet::STUFFING_BYTE,
    Error, FramingConfig, FramingError, HeadConvention, Packetizer, Reassembler,
};

fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

fn round_trip(config: &FramingConfig, input: &[u8]) -> Vec<u8> {
    let containers = Packetizer::standard(config).unwrap().encode(input).unwrap();
    Reassembler::new(config).unwrap().decode(&containers).unwrap().data
}

/// packetSize=188, headReserve=4, channelId=0x30, 200 bytes of 0xAB.
#[test]
fn test_reference_scenario() {
    let config = FramingConfig::default();
    let input = vec![0xAB; 200];

    let containers = Packetizer::standard(&config).unwrap().encode(&input).unwrap();

    // 180 + 20 bytes -> 2 packets -> one container
    assert_eq!(containers.len(), 1);
    let container = &containers[0];
    assert_eq!(container.len(), 376);

    let first = &container[..188];
    let second = &container[188..];
    assert_eq!(&first[..4], &[SYNC_BYTE, 0x40, 0x30, 0x10]);
    assert_eq!(&second[..4], &[SYNC_BYTE, 0x40, 0x30, 0x11]);
    assert_eq!(&first[4..8], &[0x00, 0x00, 0x00, 180]);
    assert_eq!(&second[4..8], &[0x02, 0x00, 0x00, 20]);
    assert!(second[28..].iter().all(|&b| b == STUFFING_BYTE));

    let output = Reassembler::new(&config).unwrap().decode(&containers).unwrap();
    assert_eq!(output.data, input);
    assert_eq!(output.packets, 2);
}

/// The stuffing that fills the last packet must not leak into the output,
/// even when the input itself ends in 0xFF bytes.
#[test]
fn test_trailing_ff_survives() {
    let config = FramingConfig::default();
    let mut input = random_bytes(7, 1000);
    input.extend_from_slice(&[0xFF; 13]);

    assert_eq!(round_trip(&config, &input), input);
}

#[test]
fn test_large_input_spans_containers() {
    let config = FramingConfig::default();
    // 348 packets per container; 1000 chunks -> 3 containers
    let input = random_bytes(42, 180 * 1000);

    let containers = Packetizer::standard(&config).unwrap().encode(&input).unwrap();
    let sizes: Vec<usize> = containers.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![348 * 188, 348 * 188, 304 * 188]);

    let output = Reassembler::new(&config).unwrap().decode(&containers).unwrap();
    assert_eq!(output.data, input);
    assert!(output.continuity_gaps.is_empty());
}

#[test]
fn test_exact_chunk_multiple() {
    let config = FramingConfig::default();
    let input = random_bytes(3, 180 * 4);

    let containers = Packetizer::standard(&config).unwrap().encode(&input).unwrap();
    assert_eq!(containers[0].len(), 4 * 188);
    assert_eq!(round_trip(&config, &input), input);
}

#[test]
fn test_custom_convention_and_reserve() {
    let config = FramingConfig {
        channel_id: 0x1FFF,
        head_reserve: 12,
        packet_size: 204,
        container_size_cap: 4096,
        convention: HeadConvention {
            first: b'F',
            middle: b'M',
            last: b'L',
        },
    };
    let input = random_bytes(11, 10_000);

    assert_eq!(round_trip(&config, &input), input);
}

#[test]
fn test_mismatched_convention_fails() {
    let encode_config = FramingConfig::default();
    let decode_config = FramingConfig {
        convention: HeadConvention {
            first: 0x10,
            middle: 0x11,
            last: 0x12,
        },
        ..FramingConfig::default()
    };

    let containers = Packetizer::standard(&encode_config)
        .unwrap()
        .encode(&[1, 2, 3])
        .unwrap();
    let result = Reassembler::new(&decode_config).unwrap().decode(&containers);

    assert!(matches!(
        result,
        Err(Error::Framing(FramingError::UnknownChunkRole { packet: 0, discriminator: 0x00 }))
    ));
}

#[test]
fn test_mismatched_packet_size_fails() {
    let containers = Packetizer::standard(&FramingConfig::default())
        .unwrap()
        .encode(&[9; 500])
        .unwrap();
    let decode_config = FramingConfig {
        packet_size: 204,
        ..FramingConfig::default()
    };

    let result = Reassembler::new(&decode_config).unwrap().decode(&containers);
    assert!(matches!(
        result,
        Err(Error::Framing(FramingError::TruncatedContainer { container: 0, .. }))
    ));
}

/// A caller-supplied closure mirroring the standard status head without a
/// length field: the shard of the final packet then carries the stuffing.
#[test]
fn test_status_only_closure_keeps_stuffing() {
    let config = FramingConfig::default();
    let status_only = |chunk: &[u8], index: usize, total: usize| {
        let status = if index == 0 {
            0x00
        } else if index == total - 1 {
            0x02
        } else {
            0x01
        };
        let mut out = vec![status, 0x00, 0x00, 0x00];
        out.extend_from_slice(chunk);
        out
    };

    let input = vec![0x11; 190];
    let containers = Packetizer::with_annotator(&config, status_only)
        .unwrap()
        .encode(&input)
        .unwrap();
    let output = Reassembler::new(&config).unwrap().decode(&containers).unwrap();

    assert_eq!(output.data.len(), 360);
    assert_eq!(&output.data[..190], input.as_slice());
    assert!(output.data[190..].iter().all(|&b| b == STUFFING_BYTE));
}

#[test]
fn test_parallel_encode_round_trip() {
    let config = FramingConfig::default();
    let input = random_bytes(99, 250_000);
    let packetizer = Packetizer::standard(&config).unwrap();

    let containers = packetizer.encode_parallel(&input, 4).unwrap();
    assert_eq!(containers, packetizer.encode(&input).unwrap());

    let output = Reassembler::new(&config).unwrap().decode(&containers).unwrap();
    assert_eq!(output.data, input);
}

fn small_config() -> impl Strategy<Value = FramingConfig> {
    (0u16..=8191, 4usize..16, 0usize..64, 1usize..8).prop_map(
        |(channel_id, head_reserve, extra, packets_per_container)| {
            let packet_size = HEADER_SIZE + head_reserve + 1 + extra;
            FramingConfig {
                channel_id,
                head_reserve,
                packet_size,
                container_size_cap: packet_size * packets_per_container,
                convention: HeadConvention::default(),
            }
        },
    )
}

proptest! {
    #[test]
    fn prop_round_trip(config in small_config(), input in proptest::collection::vec(any::<u8>(), 0..2048)) {
        prop_assert_eq!(round_trip(&config, &input), input);
    }

    #[test]
    fn prop_packet_and_container_invariants(
        config in small_config(),
        input in proptest::collection::vec(any::<u8>(), 0..2048),
    ) {
        let containers = Packetizer::standard(&config).unwrap().encode(&input).unwrap();
        let max_packets = config.max_packets_per_container();

        if input.is_empty() {
            prop_assert!(containers.is_empty());
        }

        for (i, container) in containers.iter().enumerate() {
            prop_assert!(container.len() <= config.container_size_cap);
            prop_assert_eq!(container.len() % config.packet_size, 0);
            if i + 1 < containers.len() {
                prop_assert_eq!(container.len(), max_packets * config.packet_size);
            }
        }

        // Counter cycles 0..15 across container boundaries
        let packets: Vec<&[u8]> = containers
            .iter()
            .flat_map(|c| c.chunks_exact(config.packet_size))
            .collect();
        prop_assert_eq!(packets.len(), input.len().div_ceil(config.chunk_size()));

        for (index, packet) in packets.iter().enumerate() {
            prop_assert_eq!(packet.len(), config.packet_size);
            let header = PacketHeader::unpack(packet).unwrap();
            prop_assert_eq!(header.continuity.get() as usize, index % 16);
            prop_assert_eq!(header.channel_id.get(), config.channel_id);
            prop_assert!(header.payload_start);
            prop_assert!(!header.error_indicator);
            prop_assert!(!header.priority);
            prop_assert_eq!(header.scrambling, 0);
            prop_assert_eq!(header.adaptation_control, 0b01);
        }
    }

    #[test]
    fn prop_truncated_container_rejected(
        input in proptest::collection::vec(any::<u8>(), 1..4096),
        cut in 1usize..188,
    ) {
        let config = FramingConfig::default();
        let mut containers = Packetizer::standard(&config).unwrap().encode(&input).unwrap();
        let last = containers.len() - 1;
        let len = containers[last].len();
        containers[last].truncate(len - cut);

        let result = Reassembler::new(&config).unwrap().decode(&containers);
        let is_truncated = matches!(
            result,
            Err(Error::Framing(FramingError::TruncatedContainer { .. }))
        );
        prop_assert!(is_truncated);
    }
}
