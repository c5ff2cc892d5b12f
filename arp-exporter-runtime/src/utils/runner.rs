use std::io;
use tokio::runtime::{self, Runtime};

/// Builds the runtime the exporter runs on: multi-threaded, with the I/O and time drivers
/// enabled. The processing loop, the sweep loop and the HTTP server are all spawned onto it.
pub fn build_runtime() -> io::Result<Runtime> {
    runtime::Builder::new_multi_thread()
        .thread_name("arp-exporter")
        .enable_all()
        .build()
}
