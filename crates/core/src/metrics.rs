//! Metrics for encode and decode runs.
//!
//! Tracks bytes, chunks, packets and containers across one or more groups,
//! plus continuity discontinuities seen while decoding.
//!
//! # Thread Safety
//!
//! `Metrics` is NOT thread-safe. The app updates it from the main thread
//! between core calls.

use std::time::{Duration, Instant};

use crate::reassembly::Reassembly;

#[derive(Debug, Clone)]
pub struct Metrics {
    // === Timing ===
    pub start_time: Instant,
    pub end_time: Option<Instant>,

    // === Encode ===
    /// Input files encoded
    pub groups_encoded: u64,
    /// Bytes read from input files
    pub input_bytes: u64,
    /// Chunks (one per packet) produced
    pub chunks_created: u64,
    /// Containers written
    pub containers_written: u64,
    /// Bytes written across all containers
    pub container_bytes: u64,

    // === Decode ===
    /// Groups reassembled
    pub groups_decoded: u64,
    /// Containers read
    pub containers_read: u64,
    /// Packets consumed by the reassembler
    pub packets_decoded: u64,
    /// Bytes written to reconstructed files
    pub output_bytes: u64,
    /// Continuity counter discontinuities
    pub continuity_gaps: u64,
}

impl Metrics {
    /// Create new metrics with start time set to now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            end_time: None,
            groups_encoded: 0,
            input_bytes: 0,
            chunks_created: 0,
            containers_written: 0,
            container_bytes: 0,
            groups_decoded: 0,
            containers_read: 0,
            packets_decoded: 0,
            output_bytes: 0,
            continuity_gaps: 0,
        }
    }

    /// Record one encoded group.
    pub fn record_encode(&mut self, input_len: usize, chunks: usize, containers: &[Vec<u8>]) {
        self.groups_encoded += 1;
        self.input_bytes += input_len as u64;
        self.chunks_created += chunks as u64;
        self.containers_written += containers.len() as u64;
        self.container_bytes += containers.iter().map(|c| c.len() as u64).sum::<u64>();
    }

    /// Record one decoded group.
    pub fn record_decode(&mut self, containers: usize, reassembly: &Reassembly) {
        self.groups_decoded += 1;
        self.containers_read += containers as u64;
        self.packets_decoded += reassembly.packets as u64;
        self.output_bytes += reassembly.data.len() as u64;
        self.continuity_gaps += reassembly.continuity_gaps.len() as u64;
    }

    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Container bytes per input byte. Returns 0.0 if nothing was encoded.
    pub fn overhead_ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            self.container_bytes as f64 / self.input_bytes as f64
        }
    }

    /// Compute throughput in bytes/second over input and output bytes.
    pub fn throughput_bps(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            (self.input_bytes + self.output_bytes) as f64 / duration_secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== Summary ===");
        println!("Duration: {} ms", self.duration().as_millis());
        println!();

        if self.groups_encoded > 0 {
            println!("=== Encode ===");
            println!("Groups: {}", self.groups_encoded);
            println!("Input: {} bytes ({:.2} MiB)", self.input_bytes, mib(self.input_bytes));
            println!("Packets: {}", self.chunks_created);
            println!("Containers: {} ({} bytes)", self.containers_written, self.container_bytes);
            println!("Overhead: {:.1}%", (self.overhead_ratio() - 1.0).max(0.0) * 100.0);
            println!();
        }

        if self.groups_decoded > 0 {
            println!("=== Decode ===");
            println!("Groups: {}", self.groups_decoded);
            println!("Containers: {}", self.containers_read);
            println!("Packets: {}", self.packets_decoded);
            println!("Output: {} bytes ({:.2} MiB)", self.output_bytes, mib(self.output_bytes));
            println!("Continuity gaps: {}", self.continuity_gaps);
            println!();
        }

        println!("Throughput: {:.2} MB/s", self.throughput_bps() / 1_000_000.0);
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "duration_ms={}\n\
             groups_encoded={}\n\
             input_bytes={}\n\
             chunks_created={}\n\
             containers_written={}\n\
             container_bytes={}\n\
             groups_decoded={}\n\
             containers_read={}\n\
             packets_decoded={}\n\
             output_bytes={}\n\
             continuity_gaps={}\n",
            self.duration().as_millis(),
            self.groups_encoded,
            self.input_bytes,
            self.chunks_created,
            self.containers_written,
            self.container_bytes,
            self.groups_decoded,
            self.containers_read,
            self.packets_decoded,
            self.output_bytes,
            self.continuity_gaps,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn mib(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
