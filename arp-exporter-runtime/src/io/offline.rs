use crate::io::{CaptureError, Frame, FrameSource, Next};
use pcap::{Capture, Offline};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// How fast a capture file is replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReplayMode {
    /// Every frame as fast as the processing loop takes them.
    #[default]
    Dump,
    /// Frames spaced by their capture timestamps.
    Realtime,
}

struct RealtimeState {
    start: Instant,
    capture_start: Duration,
}

/// Frames replayed from a pcap or pcapng file. No injection handle exists for a file.
pub struct PcapFile {
    path: PathBuf,
    capture: Capture<Offline>,
    mode: ReplayMode,
    realtime: Option<RealtimeState>,
}

impl PcapFile {
    pub fn open(path: impl AsRef<Path>, mode: ReplayMode) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let capture = Capture::from_file(&path).map_err(|source| CaptureError::Offline {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), ?mode, "opened capture file");

        Ok(PcapFile {
            path,
            capture,
            mode,
            realtime: None,
        })
    }

    fn read(&mut self) -> Result<Option<Frame>, CaptureError> {
        match self.capture.next_packet() {
            Ok(packet) => Ok(Some(Frame::from_packet(&packet))),
            Err(pcap::Error::NoMorePackets) => Ok(None),
            Err(source) => Err(CaptureError::Offline {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl FrameSource for PcapFile {
    async fn next_frame(&mut self, cancel: &CancellationToken) -> Result<Next, CaptureError> {
        if cancel.is_cancelled() {
            return Ok(Next::Cancelled);
        }

        let frame = match self.read()? {
            Some(frame) => frame,
            None => return Ok(Next::End),
        };

        match self.mode {
            // Reading a file never blocks, give the other tasks a turn
            ReplayMode::Dump => tokio::task::yield_now().await,
            ReplayMode::Realtime => {
                let state = self.realtime.get_or_insert_with(|| RealtimeState {
                    start: Instant::now(),
                    capture_start: frame.timestamp,
                });
                let due = state.start + frame.timestamp.saturating_sub(state.capture_start);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(Next::Cancelled),
                    _ = tokio::time::sleep_until(due) => {}
                }
            }
        }

        Ok(Next::Frame(frame))
    }
}
