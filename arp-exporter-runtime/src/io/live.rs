use crate::garp::FrameInjector;
use crate::io::{CaptureConfig, CaptureError, Frame, FrameSource, Next};
use parking_lot::Mutex;
use pcap::{Active, Capture, Linktype};
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::Arc;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The one live capture handle of a session. Frames are read from it by the processing loop and
/// gratuitous ARP frames are written through it, each side taking the lock only for a single
/// non-blocking read or a single write.
pub struct CaptureHandle {
    device: String,
    capture: Mutex<Capture<Active>>,
}

impl CaptureHandle {
    /// Reads one frame if one is buffered.
    fn try_next(&self) -> Result<Option<Frame>, CaptureError> {
        let mut capture = self.capture.lock();
        match capture.next_packet() {
            Ok(packet) => Ok(Some(Frame::from_packet(&packet))),
            // Non-blocking handles report "nothing buffered" as a timeout
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(source) => Err(CaptureError::Closed {
                device: self.device.clone(),
                source,
            }),
        }
    }
}

impl FrameInjector for CaptureHandle {
    fn inject(&self, frame: &[u8]) -> Result<(), pcap::Error> {
        self.capture.lock().sendpacket(frame)
    }
}

// Owned copy of the handle's selectable descriptor, for readiness notifications only.
struct CaptureFd(RawFd);

impl AsRawFd for CaptureFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// Live capture on one interface, filtered to ARP.
pub struct LiveCapture {
    handle: Arc<CaptureHandle>,
    readiness: AsyncFd<CaptureFd>,
}

impl LiveCapture {
    /// Opens `device` and installs the capture filter. Must be called from within a tokio runtime.
    pub fn open(device: &str, config: &CaptureConfig) -> Result<Self, CaptureError> {
        let open_error = |source| CaptureError::Open {
            device: device.to_string(),
            source,
        };

        let mut capture = Capture::from_device(device)
            .map_err(open_error)?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.read_timeout.as_millis() as i32)
            .immediate_mode(config.immediate)
            .open()
            .map_err(open_error)?;

        capture
            .filter(&config.filter, true)
            .map_err(|source| CaptureError::Filter {
                device: device.to_string(),
                source,
            })?;
        info!(device, filter = %config.filter, "capture filter installed");

        let link_type = capture.get_datalink();
        if link_type != Linktype::ETHERNET {
            warn!(device, link_type = ?link_type, "capture link type is not Ethernet");
        }

        let capture = capture.setnonblock().map_err(open_error)?;
        let readiness = AsyncFd::with_interest(CaptureFd(capture.as_raw_fd()), Interest::READABLE)
            .map_err(|source| CaptureError::Poll {
                device: device.to_string(),
                source,
            })?;

        info!(
            device,
            snaplen = config.snaplen,
            promiscuous = config.promiscuous,
            "opened live capture"
        );

        Ok(LiveCapture {
            handle: Arc::new(CaptureHandle {
                device: device.to_string(),
                capture: Mutex::new(capture),
            }),
            readiness,
        })
    }

    /// The shared handle, for injection.
    pub fn handle(&self) -> Arc<CaptureHandle> {
        Arc::clone(&self.handle)
    }
}

impl FrameSource for LiveCapture {
    async fn next_frame(&mut self, cancel: &CancellationToken) -> Result<Next, CaptureError> {
        loop {
            if cancel.is_cancelled() {
                return Ok(Next::Cancelled);
            }

            let mut ready = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Next::Cancelled),
                ready = self.readiness.readable() => ready.map_err(|source| CaptureError::Poll {
                    device: self.handle.device.clone(),
                    source,
                })?,
            };

            match self.handle.try_next()? {
                Some(frame) => return Ok(Next::Frame(frame)),
                None => ready.clear_ready(),
            }
        }
    }
}
