//! Containers: bounded runs of packets, the unit persisted as one file.
//!
//! A container is `1..=max_packets` packets concatenated with no separators.
//! Containers partition the packet sequence contiguously and in order; only
//! the last one of a group may hold fewer than `max_packets`. Container
//! boundaries carry no meaning for reassembly.

use std::slice::ChunksExact;

/// Size cap of the reference configuration (64 KiB)
pub const DEFAULT_CONTAINER_SIZE_CAP: usize = 65536;

/// Packets that fit in one container: `floor(cap / packet_size)`.
pub fn max_packets_per_container(container_size_cap: usize, packet_size: usize) -> usize {
    container_size_cap / packet_size
}

/// Concatenate `packets` into containers of at most `max_packets` each.
///
/// Empty input yields no containers.
pub fn pack_containers(packets: &[Vec<u8>], max_packets: usize) -> Vec<Vec<u8>> {
    debug_assert!(max_packets > 0);
    packets.chunks(max_packets).map(|run| run.concat()).collect()
}

/// Split a container into its packets.
///
/// Returns `Err(len)` with the container length when it is not a whole number
/// of packets; the caller knows which container it was.
pub fn split_container(container: &[u8], packet_size: usize) -> Result<ChunksExact<'_, u8>, usize> {
    if container.len() % packet_size != 0 {
        return Err(container.len());
    }
    Ok(container.chunks_exact(packet_size))
}
