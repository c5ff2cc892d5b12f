use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

mod live;
pub use self::live::*;

mod offline;
pub use self::offline::*;

mod interface;
pub use self::interface::*;

#[cfg(target_os = "linux")]
mod linux;

/// Capture filter installed on live handles.
pub const ARP_FILTER: &str = "arp";

/// One captured frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Capture time, relative to the Unix epoch.
    pub timestamp: Duration,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(data: Vec<u8>) -> Self {
        Frame {
            timestamp: Duration::from_secs(0),
            data,
        }
    }

    pub(crate) fn from_packet(packet: &pcap::Packet) -> Self {
        let ts = packet.header.ts;
        Frame {
            timestamp: capture_timestamp(i64::from(ts.tv_sec), i64::from(ts.tv_usec)),
            data: packet.data.to_vec(),
        }
    }
}

/// Converts a pcap record timestamp. time_t and suseconds_t are signed and a capture file can
/// hold anything in them: negative seconds become zero and microseconds are clamped to
/// `0..1_000_000`.
fn capture_timestamp(secs: i64, usecs: i64) -> Duration {
    let secs = u64::try_from(secs).unwrap_or(0);
    let nanos = usecs.clamp(0, 999_999) as u32 * 1_000;
    Duration::new(secs, nanos)
}

/// What a frame source produced when asked for the next frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Next {
    Frame(Frame),
    /// The cancellation token fired while waiting.
    Cancelled,
    /// A finite source (a capture file) has no more frames.
    End,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("error opening device {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: pcap::Error,
    },
    #[error("error setting BPF filter on {device}: {source}")]
    Filter {
        device: String,
        #[source]
        source: pcap::Error,
    },
    #[error("capture on {device} closed unexpectedly: {source}")]
    Closed {
        device: String,
        #[source]
        source: pcap::Error,
    },
    #[error("error waiting for frames on {device}: {source}")]
    Poll {
        device: String,
        #[source]
        source: std::io::Error,
    },
    #[error("error reading capture file {}: {source}", path.display())]
    Offline {
        path: PathBuf,
        #[source]
        source: pcap::Error,
    },
}

/// A sequence of raw frames the processing loop pulls from.
pub trait FrameSource: Send {
    /// Waits for the next frame, or for `cancel` to fire. Returning an error ends the stream.
    fn next_frame(
        &mut self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Next, CaptureError>> + Send;
}

/// Settings for opening a live capture.
#[derive(Clone, Debug)]
pub struct CaptureConfig {
    pub snaplen: i32,
    pub promiscuous: bool,
    pub read_timeout: Duration,
    pub immediate: bool,
    pub filter: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            snaplen: 65536,
            promiscuous: true,
            read_timeout: Duration::from_secs(30),
            immediate: true,
            filter: ARP_FILTER.to_string(),
        }
    }
}
