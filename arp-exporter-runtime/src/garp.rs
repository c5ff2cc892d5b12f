use arp_exporter_packets::{ArpFrame, MacAddr};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Something raw Ethernet frames can be written to. The live capture handle is the production
/// injector.
pub trait FrameInjector: Send + Sync {
    fn inject(&self, frame: &[u8]) -> Result<(), pcap::Error>;
}

#[derive(Debug, Error)]
pub enum AnnounceError {
    #[error("only IPv4 addresses are supported for gARP, got {0}")]
    UnsupportedAddressFamily(IpAddr),
    #[error("no capture handle is open for injection")]
    HandleUnavailable,
    #[error("error injecting packet: {0}")]
    InjectionFailed(#[source] pcap::Error),
}

/// Narrows `ip` to IPv4, the only family a gratuitous ARP can announce. IPv4-mapped IPv6
/// addresses (`::ffff:a.b.c.d`) are accepted as the IPv4 address they carry.
pub fn require_ipv4(ip: IpAddr) -> Result<Ipv4Addr, AnnounceError> {
    match ip {
        IpAddr::V4(ipv4) => Ok(ipv4),
        IpAddr::V6(ipv6) => ipv6
            .to_ipv4_mapped()
            .ok_or(AnnounceError::UnsupportedAddressFamily(ip)),
    }
}

/// Builds gratuitous ARP frames for one interface and writes them through an injector.
#[derive(Clone)]
pub struct GratuitousArpSender {
    injector: Arc<dyn FrameInjector>,
    hardware_addr: MacAddr,
}

impl GratuitousArpSender {
    pub fn new(injector: Arc<dyn FrameInjector>, hardware_addr: MacAddr) -> Self {
        GratuitousArpSender {
            injector,
            hardware_addr,
        }
    }

    /// Announces that `ip` is at this interface's hardware address. Exactly one frame is written
    /// on success, none when `ip` is not IPv4.
    pub fn announce(&self, ip: IpAddr) -> Result<(), AnnounceError> {
        let ipv4 = require_ipv4(ip)?;
        let frame = ArpFrame::gratuitous(self.hardware_addr, ipv4);
        self.injector
            .inject(frame.ethernet().as_bytes())
            .map_err(AnnounceError::InjectionFailed)?;
        info!(ip = %ipv4, hardware_addr = %self.hardware_addr, "sent gratuitous ARP");
        Ok(())
    }
}
