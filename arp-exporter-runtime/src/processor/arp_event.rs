use crate::io::Frame;
use crate::processor::Processor;
use crate::state::{LabelCache, LabelSet};
use arp_exporter_packets::{
    hardware_addr_string, protocol_addr_string, ArpFrame, ArpOp, EthernetFrame, MacAddr,
};
use std::convert::TryFrom;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// One observed ARP packet, with every address already in the form it is labelled with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArpEvent {
    pub node: String,
    pub device: String,
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub sender_mac: String,
    pub sender_ip: String,
    pub target_mac: String,
    pub target_ip: String,
    pub op: ArpOp,
    pub timestamp: Duration,
}

impl ArpEvent {
    /// Parses `frame` as an Ethernet frame carrying ARP. Fails on anything else.
    pub fn from_frame(node: &str, device: &str, frame: &Frame) -> Result<ArpEvent, &'static str> {
        let ethernet = EthernetFrame::from_buffer(frame.data.clone(), 0)?;
        let arp = ArpFrame::try_from(ethernet)?;

        Ok(ArpEvent {
            node: node.to_string(),
            device: device.to_string(),
            src_mac: arp.ethernet().src_mac(),
            dst_mac: arp.ethernet().dest_mac(),
            sender_mac: hardware_addr_string(arp.sender_hardware_addr()),
            sender_ip: protocol_addr_string(arp.sender_protocol_addr()),
            target_mac: hardware_addr_string(arp.target_hardware_addr()),
            target_ip: protocol_addr_string(arp.target_protocol_addr()),
            op: arp.op(),
            timestamp: frame.timestamp,
        })
    }

    pub fn label_set(&self) -> LabelSet {
        LabelSet {
            node: self.node.clone(),
            device: self.device.clone(),
            src_mac: self.src_mac.to_string(),
            dst_mac: self.dst_mac.to_string(),
            sender_mac: self.sender_mac.clone(),
            sender_ip: self.sender_ip.clone(),
            target_mac: self.target_mac.clone(),
            target_ip: self.target_ip.clone(),
            op_type: self.op.to_string(),
        }
    }
}

/// Turns captured frames into ARP events and counts each one in the label cache. Frames that are
/// not ARP are dropped without touching any state.
pub struct ArpEventProcessor {
    node: String,
    device: String,
    cache: Arc<LabelCache>,
}

impl ArpEventProcessor {
    pub fn new(node: String, device: String, cache: Arc<LabelCache>) -> Self {
        ArpEventProcessor {
            node,
            device,
            cache,
        }
    }
}

impl Processor for ArpEventProcessor {
    type Input = Frame;
    type Output = ArpEvent;

    fn process(&mut self, frame: Self::Input) -> Option<Self::Output> {
        let event = match ArpEvent::from_frame(&self.node, &self.device, &frame) {
            Ok(event) => event,
            Err(reason) => {
                trace!(len = frame.data.len(), reason, "skipping frame");
                return None;
            }
        };

        debug!(
            op = %event.op,
            timestamp = ?event.timestamp,
            src_mac = %event.src_mac,
            dst_mac = %event.dst_mac,
            sender_mac = %event.sender_mac,
            sender_ip = %event.sender_ip,
            target_mac = %event.target_mac,
            target_ip = %event.target_ip,
            "ARP packet"
        );

        self.cache.observe(event.label_set(), Instant::now());
        Some(event)
    }
}
