//! Sample input generation for the demo.
//!
//! Samples mix byte patterns that are easy to get wrong in framing:
//! - runs of 0xFF, which look exactly like packet stuffing
//! - runs of 0x47, the packet sync byte
//! - text-like data
//! - random bytes
//!
//! Section boundaries are deliberately unaligned with any packet size, and
//! roughly half the samples end in 0xFF.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate `size_bytes` of deterministic sample data.
pub fn generate_sample_data(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes);

    while data.len() < size_bytes {
        let section = (size_bytes - data.len()).min(rng.gen_range(1..=5000));

        match rng.gen_range(0..10) {
            0..=1 => data.extend(std::iter::repeat(0xFF).take(section)),
            2 => data.extend(std::iter::repeat(0x47).take(section)),
            3..=5 => {
                let alphabet = b"abcdefghijklmnopqrstuvwxyz .!,\n";
                data.extend((0..section).map(|_| alphabet[rng.gen_range(0..alphabet.len())]));
            }
            _ => data.extend((0..section).map(|_| rng.gen::<u8>())),
        }
    }

    if size_bytes > 0 && rng.gen_bool(0.5) {
        let tail = size_bytes.min(rng.gen_range(1..=64));
        data[size_bytes - tail..].fill(0xFF);
    }

    data
}

/// Write generated data to a file.
pub fn write_sample_file(path: &Path, seed: u64, size_bytes: usize) -> std::io::Result<Vec<u8>> {
    let data = generate_sample_data(seed, size_bytes);
    std::fs::write(path, &data)?;
    Ok(data)
}
