/// Processors turn one captured frame into at most one output. The ARP event processor is the
/// only one the exporter runs: it parses a frame into an `ArpEvent` and records the event's label
/// set into the label cache, which bumps the matching counter series.
pub mod processor;

/// Label sets, fingerprints and the label cache. The cache remembers when every label combination
/// was last observed, and a periodic sweep deletes the combinations (and their counter series)
/// that went quiet. This is what keeps the number of series from growing without bound.
pub mod state;

/// The `arp_packets_total` counter and the registry it is exposed from.
pub mod metrics;

/// Frame sources (live capture and capture file replay), the shared capture handle and interface
/// lookups.
pub mod io;

/// Gratuitous ARP announcements, written through the capture handle.
pub mod garp;

/// The monitoring session: owns the cache, the metrics and the injection handle, and runs the
/// processing and sweep loops.
pub mod session;

/// Utility module
pub mod utils;
