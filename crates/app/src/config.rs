//! Command-line configuration for the tsframe tool.
//!
//! Framing parameters resolve as: `--config <PATH>` or `$TSFRAME_CONFIG` →
//! built-in defaults, then individual command-line flags on top. The same
//! parameters must be used to encode and decode a group.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tsframe_core::FramingConfig;

/// What to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Split one file into `<group>-<index>.ts` containers
    Encode {
        input: PathBuf,
        output_dir: PathBuf,
        /// Group name (None = input file stem)
        group: Option<String>,
    },

    /// Merge every group found in a directory
    Decode {
        input_dir: PathBuf,
        output_dir: PathBuf,
        /// Extension of reconstructed files
        ext: String,
    },

    /// Generate sample files, encode them, decode them, and verify
    Demo {
        seed: u64,
        files: usize,
        size_bytes: usize,
        work_dir: PathBuf,
    },

    Help,
}

/// Framing flags given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FramingOverrides {
    pub channel_id: Option<u16>,
    pub head_reserve: Option<usize>,
    pub packet_size: Option<usize>,
    pub container_size_cap: Option<usize>,
}

impl FramingOverrides {
    fn apply(&self, config: &mut FramingConfig) {
        if let Some(v) = self.channel_id {
            config.channel_id = v;
        }
        if let Some(v) = self.head_reserve {
            config.head_reserve = v;
        }
        if let Some(v) = self.packet_size {
            config.packet_size = v;
        }
        if let Some(v) = self.container_size_cap {
            config.container_size_cap = v;
        }
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub command: Command,

    // === Framing ===
    /// Framing config file
    pub config_file: Option<PathBuf>,
    pub overrides: FramingOverrides,

    // === Behavior ===
    /// Worker threads for encoding (1 = sequential)
    pub threads: usize,
    /// Whether to print the resolved framing config
    pub print_config: bool,
    /// Whether to print the metrics summary
    pub print_metrics: bool,
}

impl Config {
    /// Parse configuration from command-line arguments (without the program
    /// name).
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let Some(subcommand) = args.first() else {
            return Ok(Self::with_command(Command::Help));
        };

        let mut input: Option<PathBuf> = None;
        let mut output: Option<PathBuf> = None;
        let mut group: Option<String> = None;
        let mut ext: Option<String> = None;
        let mut seed: Option<u64> = None;
        let mut files: Option<usize> = None;
        let mut size_bytes: Option<usize> = None;
        let mut work_dir: Option<PathBuf> = None;

        let mut config = Self::with_command(Command::Help);

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--in" => input = Some(PathBuf::from(value(args, &mut i, "--in")?)),
                "--out" => output = Some(PathBuf::from(value(args, &mut i, "--out")?)),
                "--group" => group = Some(value(args, &mut i, "--group")?.to_string()),
                "--ext" => ext = Some(value(args, &mut i, "--ext")?.trim_start_matches('.').to_string()),
                "--seed" => seed = Some(number(args, &mut i, "--seed")?),
                "--files" => files = Some(number(args, &mut i, "--files")?),
                "--size" => size_bytes = Some(number(args, &mut i, "--size")?),
                "--work" => work_dir = Some(PathBuf::from(value(args, &mut i, "--work")?)),
                "--config" => config.config_file = Some(PathBuf::from(value(args, &mut i, "--config")?)),
                "--channel-id" => config.overrides.channel_id = Some(number(args, &mut i, "--channel-id")?),
                "--head-reserve" => config.overrides.head_reserve = Some(number(args, &mut i, "--head-reserve")?),
                "--packet-size" => config.overrides.packet_size = Some(number(args, &mut i, "--packet-size")?),
                "--container-cap" => {
                    config.overrides.container_size_cap = Some(number(args, &mut i, "--container-cap")?)
                }
                "--threads" => {
                    config.threads = number(args, &mut i, "--threads")?;
                    if config.threads == 0 {
                        return Err("--threads must be at least 1".to_string());
                    }
                }
                "--print-config" => config.print_config = true,
                "--no-metrics" => config.print_metrics = false,
                "--help" | "-h" => return Ok(Self::with_command(Command::Help)),
                other => return Err(format!("unknown argument: {}", other)),
            }
            i += 1;
        }

        config.command = match subcommand.as_str() {
            "encode" => Command::Encode {
                input: input.ok_or("encode requires --in <FILE>")?,
                output_dir: output.ok_or("encode requires --out <DIR>")?,
                group,
            },
            "decode" => Command::Decode {
                input_dir: input.ok_or("decode requires --in <DIR>")?,
                output_dir: output.ok_or("decode requires --out <DIR>")?,
                ext: ext.unwrap_or_else(|| "bin".to_string()),
            },
            "demo" => Command::Demo {
                seed: seed.unwrap_or_else(time_seed),
                files: files.unwrap_or(3),
                size_bytes: size_bytes.unwrap_or(256 * 1024),
                work_dir: work_dir.unwrap_or_else(|| PathBuf::from("./tsframe-demo")),
            },
            "help" | "--help" | "-h" => Command::Help,
            other => return Err(format!("unknown command: {}", other)),
        };

        Ok(config)
    }

    fn with_command(command: Command) -> Self {
        Self {
            command,
            config_file: None,
            overrides: FramingOverrides::default(),
            threads: 1,
            print_config: false,
            print_metrics: true,
        }
    }

    /// Resolve and validate the framing parameters.
    pub fn framing(&self) -> anyhow::Result<FramingConfig> {
        let mut framing = FramingConfig::load(self.config_file.as_deref()).context("loading framing config")?;
        self.overrides.apply(&mut framing);
        framing.validate().context("invalid framing parameters")?;
        Ok(framing)
    }
}

/// Take the value following flag `args[*i]`.
fn value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", flag))
}

/// Take a numeric value; accepts a `0x` prefix for hex.
fn number<T>(args: &[String], i: &mut usize, flag: &str) -> Result<T, String>
where
    T: std::str::FromStr + TryFrom<u64>,
{
    let raw = value(args, i, flag)?;
    let invalid = || format!("invalid {}: {}", flag.trim_start_matches('-'), raw);

    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => {
            let n = u64::from_str_radix(hex, 16).map_err(|_| invalid())?;
            T::try_from(n).map_err(|_| invalid())
        }
        None => raw.parse().map_err(|_| invalid()),
    }
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Group name for an input file: its stem.
pub fn default_group_name(input: &Path) -> Option<String> {
    input.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

pub fn print_help() {
    println!("tsframe: split files into .ts segment containers and merge them back");
    println!();
    println!("USAGE:");
    println!("    tsframe encode --in <FILE> --out <DIR> [--group <NAME>] [OPTIONS]");
    println!("    tsframe decode --in <DIR> --out <DIR> [--ext <EXT>] [OPTIONS]");
    println!("    tsframe demo [--seed <N>] [--files <N>] [--size <BYTES>] [--work <DIR>] [OPTIONS]");
    println!();
    println!("FRAMING (must match between encode and decode):");
    println!("    --config <PATH>         TOML framing config (default: $TSFRAME_CONFIG)");
    println!("    --channel-id <N>        13-bit channel id (default: 0x30)");
    println!("    --head-reserve <N>      Chunk head bytes, at least 4 (default: 4)");
    println!("    --packet-size <N>       Packet size (default: 188)");
    println!("    --container-cap <N>     Max container size (default: 65536)");
    println!();
    println!("OPTIONS:");
    println!("    --threads <N>           Encode worker threads (default: 1)");
    println!("    --print-config          Print resolved framing config");
    println!("    --no-metrics            Don't print metrics summary");
    println!("    --help, -h              Print this help");
    println!();
    println!("Set RUST_LOG=debug for per-group logging.");
    println!();
    println!("EXAMPLES:");
    println!("    tsframe encode --in photo.jpg --out out        # out/photo-0.ts, out/photo-1.ts, ...");
    println!("    tsframe decode --in out --out decoded --ext jpg");
    println!("    tsframe demo --seed 42");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_args_is_help() {
        assert_eq!(Config::from_args(&[]).unwrap().command, Command::Help);
    }

    #[test]
    fn test_encode_args() {
        let config = Config::from_args(&args(&["encode", "--in", "a.jpg", "--out", "out", "--threads", "4"])).unwrap();
        assert_eq!(
            config.command,
            Command::Encode {
                input: PathBuf::from("a.jpg"),
                output_dir: PathBuf::from("out"),
                group: None,
            }
        );
        assert_eq!(config.threads, 4);
        assert!(config.print_metrics);
    }

    #[test]
    fn test_decode_defaults_ext() {
        let config = Config::from_args(&args(&["decode", "--in", "out", "--out", "dec", "--no-metrics"])).unwrap();
        assert_eq!(
            config.command,
            Command::Decode {
                input_dir: PathBuf::from("out"),
                output_dir: PathBuf::from("dec"),
                ext: "bin".to_string(),
            }
        );
        assert!(!config.print_metrics);
    }

    #[test]
    fn test_ext_strips_dot() {
        let config = Config::from_args(&args(&["decode", "--in", "a", "--out", "b", "--ext", ".jpg"])).unwrap();
        assert!(matches!(config.command, Command::Decode { ref ext, .. } if ext == "jpg"));
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_args(&args(&["encode", "--in", "a.jpg"])).unwrap_err();
        assert!(err.contains("--out"));
    }

    #[test]
    fn test_hex_channel_id() {
        let config = Config::from_args(&args(&["demo", "--seed", "1", "--channel-id", "0x1ff"])).unwrap();
        assert_eq!(config.overrides.channel_id, Some(0x1FF));

        let framing = config.framing().unwrap();
        assert_eq!(framing.channel_id, 0x1FF);
        assert_eq!(framing.packet_size, 188);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let config = Config::from_args(&args(&["demo", "--channel-id", "9000"])).unwrap();
        assert!(config.framing().is_err());

        let err = Config::from_args(&args(&["demo", "--channel-id", "0x1FFFFF"])).unwrap_err();
        assert!(err.contains("invalid channel-id"));

        let config = Config::from_args(&args(&["demo", "--head-reserve", &usize::MAX.to_string()])).unwrap();
        assert!(config.framing().is_err());
    }

    #[test]
    fn test_unknown_argument() {
        assert!(Config::from_args(&args(&["encode", "--bogus"])).is_err());
        assert!(Config::from_args(&args(&["transmogrify"])).is_err());
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(Config::from_args(&args(&["demo", "--threads", "0"])).is_err());
    }

    #[test]
    fn test_default_group_name() {
        assert_eq!(default_group_name(Path::new("dir/test0.jpg")), Some("test0".to_string()));
    }
}
