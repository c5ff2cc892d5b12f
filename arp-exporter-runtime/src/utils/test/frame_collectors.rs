use crate::garp::FrameInjector;
use crossbeam::channel::{unbounded, Receiver, Sender};

/// Injector that writes every frame into a channel, so a test can check what would have gone
/// out on the wire.
pub struct RecordingInjector {
    frames: Sender<Vec<u8>>,
}

impl RecordingInjector {
    pub fn new() -> (Self, Receiver<Vec<u8>>) {
        let (frames, receiver) = unbounded();
        (RecordingInjector { frames }, receiver)
    }
}

impl FrameInjector for RecordingInjector {
    fn inject(&self, frame: &[u8]) -> Result<(), pcap::Error> {
        // Nobody listening is not a failure of the injection itself
        let _ = self.frames.send(frame.to_vec());
        Ok(())
    }
}

/// Injector whose every write fails.
pub struct FailingInjector;

impl FrameInjector for FailingInjector {
    fn inject(&self, _frame: &[u8]) -> Result<(), pcap::Error> {
        Err(pcap::Error::PcapError("send: Network is down".to_string()))
    }
}
