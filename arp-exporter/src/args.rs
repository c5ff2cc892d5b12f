//! Command line arguments

use arp_exporter_runtime::io::ReplayMode;
use arp_exporter_runtime::session::{MonitorConfig, DEFAULT_DEVICE};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "arp-exporter")]
#[command(
    version,
    about = "Export ARP traffic as Prometheus metrics and send gratuitous ARP on request",
    long_about = None
)]
pub struct Cli {
    /// Network interface to monitor and inject gratuitous ARP on (e.g. eth0, en0)
    #[arg(short = 'i', long, value_name = "INTERFACE", default_value = DEFAULT_DEVICE)]
    pub interface: String,

    /// Address the HTTP server listens on
    #[arg(short = 'l', long, value_name = "ADDR", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Seconds between two sweeps of inactive label combinations
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval: u64,

    /// Seconds a label combination may go unobserved before its series is deleted
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub inactivity: u64,

    /// Seconds the processing loop and the HTTP server get to stop after an interrupt
    #[arg(long, value_name = "SECONDS", default_value_t = 5)]
    pub shutdown_grace: u64,

    /// Replay frames from a capture file instead of capturing on the interface
    #[arg(short = 'r', long, value_name = "PCAP")]
    pub read_file: Option<PathBuf>,

    /// Replay the capture file at the pace it was recorded
    #[arg(long, requires = "read_file")]
    pub realtime: bool,

    /// Verbose output (-v, -vv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            device: self.interface.clone(),
            sweep_interval: Duration::from_secs(self.sweep_interval),
            inactivity: Duration::from_secs(self.inactivity),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace)
    }

    pub fn replay_mode(&self) -> ReplayMode {
        if self.realtime {
            ReplayMode::Realtime
        } else {
            ReplayMode::Dump
        }
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
