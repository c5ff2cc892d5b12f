use crate::state::{LabelSet, LABEL_NAMES};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use thiserror::Error;

pub const ARP_PACKETS_TOTAL: &str = "arp_packets_total";

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics registry error: {0}")]
    Registry(#[from] prometheus::Error),
    #[error("metrics exposition is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// The ARP packet counter, registered in a registry private to one monitoring session.
///
/// Cloning is cheap, clones share the same series.
#[derive(Clone)]
pub struct ArpMetrics {
    registry: Registry,
    packets: IntCounterVec,
}

impl ArpMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let packets = IntCounterVec::new(
            Opts::new(
                ARP_PACKETS_TOTAL,
                "Total number of ARP packets observed, labelled.",
            ),
            &LABEL_NAMES,
        )?;
        let registry = Registry::new();
        registry.register(Box::new(packets.clone()))?;
        Ok(ArpMetrics { registry, packets })
    }

    /// Adds one to the series of `labels`, creating it at zero first if needed.
    pub fn increment(&self, labels: &LabelSet) {
        self.packets.with_label_values(&labels.values()).inc();
    }

    /// Deletes the series of `labels`. Returns false if no such series existed.
    pub fn remove(&self, labels: &LabelSet) -> bool {
        self.packets.remove_label_values(&labels.values()).is_ok()
    }

    /// Current value of the series of `labels`, without creating it.
    pub fn count(&self, labels: &LabelSet) -> Option<u64> {
        let wanted = labels.values();
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == ARP_PACKETS_TOTAL)
            .flat_map(|family| family.get_metric().iter())
            .find(|metric| {
                metric.get_label().iter().all(|pair| {
                    LABEL_NAMES
                        .iter()
                        .position(|name| *name == pair.get_name())
                        .map_or(false, |i| wanted[i] == pair.get_value())
                })
            })
            .map(|metric| metric.get_counter().get_value() as u64)
    }

    /// Number of label combinations that currently have a series.
    pub fn series_count(&self) -> usize {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == ARP_PACKETS_TOTAL)
            .map(|family| family.get_metric().len())
            .sum()
    }

    /// Renders every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}
