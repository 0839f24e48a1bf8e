//! CLI argument definitions for `inbursts` and `inbursts-report`.
//!
//! Uses `clap` v4 derive macros. The capture binary disables clap's built-in
//! help flag: `-h`/`--help` print the usage text to stderr and exit with code 2.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use inbursts_core::config::InburstsConfig;

/// Usage text printed for `-h`/`--help`.
pub const USAGE: &str = "\
usage: inbursts [-h] [-i INTERFACE] [-c COUNT] [-o OUTPUT] [--config FILE]
                [--local-addr IPV4] [--read PCAP] [--log-level LEVEL] [--log-format FORMAT]
  -h                 : Print help and exit.
  -i                 : Interface to collect otherwise defaults to first non-loopback interface.
  -c                 : Number of packets to collect otherwise collects forever.
  -o=inbursts.out    : Output file for data.
  --config           : TOML configuration file.
  --local-addr       : IPv4 address counted as inbound instead of the interface address.
  --read             : Replay a pcap savefile instead of capturing live (needs --local-addr).
  --log-level        : trace, debug, info, warn or error.
  --log-format       : json, pretty or compact.
  -V                 : Print version and exit.
";

/// Millisecond inbound burst capture.
///
/// Counts bytes and packets addressed to the interface's own IPv4 address
/// per millisecond and appends one record per busy millisecond to the output file.
#[derive(Parser, Debug)]
#[command(name = "inbursts")]
#[command(version, about, long_about = None, disable_help_flag = true)]
pub struct CaptureCli {
    /// Print usage and exit with code 2.
    #[arg(short = 'h', long = "help")]
    pub help: bool,

    /// Interface to capture on (default: first non-loopback interface).
    #[arg(short = 'i', long = "interface")]
    pub interface: Option<String>,

    /// Number of frames to capture before stopping (0 = unbounded).
    #[arg(short = 'c', long = "count")]
    pub count: Option<u64>,

    /// Output file for burst records.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Path to an inbursts.toml configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the local IPv4 address used to classify inbound frames.
    #[arg(long)]
    pub local_addr: Option<Ipv4Addr>,

    /// Replay a pcap savefile instead of capturing live.
    #[arg(long = "read")]
    pub read: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty, compact).
    #[arg(long)]
    pub log_format: Option<String>,
}

impl CaptureCli {
    /// Apply command-line overrides on top of file/env configuration.
    ///
    /// Flags take precedence over every other source.
    pub fn apply_overrides(&self, config: &mut InburstsConfig) {
        if let Some(interface) = &self.interface {
            config.capture.interface.clone_from(interface);
        }
        if let Some(count) = self.count {
            config.capture.count = count;
        }
        if let Some(output) = &self.output {
            config.output.path = output.display().to_string();
        }
        if let Some(addr) = self.local_addr {
            config.capture.local_addr = addr.to_string();
        }
        if let Some(read) = &self.read {
            config.capture.savefile = read.display().to_string();
        }
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
    }
}

/// Supported report output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Summarize an inbursts output file over elapsed time.
#[derive(Parser, Debug)]
#[command(name = "inbursts-report")]
#[command(version, about, long_about = None)]
pub struct ReportCli {
    /// Burst record file written by `inbursts`.
    #[arg(short, long, default_value = "inbursts.out")]
    pub input: PathBuf,

    /// Minimum elapsed time (ms) since the first record.
    #[arg(long)]
    pub min: Option<u64>,

    /// Maximum elapsed time (ms) since the first record.
    #[arg(long)]
    pub max: Option<u64>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also print the `elapsed_ms,kbytes_in,packets_in` series.
    #[arg(long)]
    pub series: bool,

    /// Log level for diagnostics on stderr.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
