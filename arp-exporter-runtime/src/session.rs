use crate::garp::{require_ipv4, AnnounceError, FrameInjector, GratuitousArpSender};
use crate::io::{CaptureError, FrameSource, Next};
use crate::metrics::{ArpMetrics, MetricsError};
use crate::processor::{ArpEventProcessor, Processor};
use crate::state::{LabelCache, DEFAULT_INACTIVITY};
use arp_exporter_packets::MacAddr;
use std::net::IpAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_DEVICE: &str = "eth0";
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub device: String,
    pub sweep_interval: Duration,
    pub inactivity: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            device: DEFAULT_DEVICE.to_string(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            inactivity: DEFAULT_INACTIVITY,
        }
    }
}

/// Monitoring of one interface: the label cache with its counter, the processing and sweep loops
/// that share it, and the gratuitous ARP sender once a live handle is attached.
///
/// A session is shared behind an `Arc` by the loops and the HTTP handlers.
pub struct MonitorSession {
    node: String,
    config: MonitorConfig,
    cache: Arc<LabelCache>,
    sender: OnceLock<GratuitousArpSender>,
}

impl MonitorSession {
    pub fn new(node: String, config: MonitorConfig) -> Result<Self, MetricsError> {
        let cache = Arc::new(LabelCache::new(ArpMetrics::new()?, config.inactivity));
        Ok(MonitorSession {
            node,
            config,
            cache,
            sender: OnceLock::new(),
        })
    }

    pub fn cache(&self) -> &Arc<LabelCache> {
        &self.cache
    }

    pub fn metrics(&self) -> &ArpMetrics {
        self.cache.metrics()
    }

    /// Makes `injector` the handle announcements are written through. Only the first call takes
    /// effect, later ones are ignored and return false.
    pub fn attach_injector(
        &self,
        injector: Arc<dyn FrameInjector>,
        hardware_addr: MacAddr,
    ) -> bool {
        let attached = self
            .sender
            .set(GratuitousArpSender::new(injector, hardware_addr))
            .is_ok();
        if attached {
            info!(device = %self.config.device, %hardware_addr, "injection handle attached");
        } else {
            warn!(device = %self.config.device, "injection handle already attached, ignoring");
        }
        attached
    }

    pub fn is_injection_ready(&self) -> bool {
        self.sender.get().is_some()
    }

    /// Sends a gratuitous ARP for `ip` on the monitored interface.
    pub fn announce(&self, ip: IpAddr) -> Result<(), AnnounceError> {
        let ipv4 = require_ipv4(ip)?;
        self.sender
            .get()
            .ok_or(AnnounceError::HandleUnavailable)?
            .announce(IpAddr::V4(ipv4))
    }

    pub fn processor(&self) -> ArpEventProcessor {
        ArpEventProcessor::new(
            self.node.clone(),
            self.config.device.clone(),
            Arc::clone(&self.cache),
        )
    }

    /// The processing loop. Pulls frames from `source` and processes each one until `cancel`
    /// fires or a finite source runs out. A source error ends the loop and is returned.
    pub async fn run_monitor<S: FrameSource>(
        &self,
        source: &mut S,
        cancel: &CancellationToken,
    ) -> Result<(), CaptureError> {
        let mut processor = self.processor();
        let mut frames: u64 = 0;
        info!(device = %self.config.device, node = %self.node, "processing loop started");

        loop {
            match source.next_frame(cancel).await? {
                Next::Frame(frame) => {
                    frames += 1;
                    processor.process(frame);
                }
                Next::Cancelled => {
                    info!(device = %self.config.device, frames, "processing loop stopped");
                    return Ok(());
                }
                Next::End => {
                    info!(device = %self.config.device, frames, "capture source exhausted");
                    return Ok(());
                }
            }
        }
    }

    /// The sweep loop. Evicts inactive label combinations every `sweep_interval`, the first
    /// sweep one full interval after the start, until `cancel` fires.
    pub async fn run_sweeper(&self, cancel: CancellationToken) {
        let period = self.config.sweep_interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("sweep loop stopped");
                    return;
                }
                tick = ticker.tick() => {
                    let evicted = self.cache.sweep(tick.into_std());
                    if evicted > 0 {
                        info!(evicted, remaining = self.cache.len(), "evicted inactive ARP series");
                    } else {
                        debug!(remaining = self.cache.len(), "sweep evicted nothing");
                    }
                }
            }
        }
    }
}
