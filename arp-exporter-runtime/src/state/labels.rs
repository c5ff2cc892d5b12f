use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Label names of `arp_packets_total`, in the order `LabelSet::values` returns them.
pub const LABEL_NAMES: [&str; 9] = [
    "node",
    "device",
    "src_mac",
    "dst_mac",
    "sender_mac",
    "sender_ip",
    "target_mac",
    "target_ip",
    "op_type",
];

/// One label combination of the ARP packet counter. Every field is already rendered in its
/// textual form, so two events with equal fields always give equal label sets.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LabelSet {
    pub node: String,
    pub device: String,
    pub src_mac: String,
    pub dst_mac: String,
    pub sender_mac: String,
    pub sender_ip: String,
    pub target_mac: String,
    pub target_ip: String,
    pub op_type: String,
}

impl LabelSet {
    pub fn values(&self) -> [&str; 9] {
        [
            self.node.as_str(),
            self.device.as_str(),
            self.src_mac.as_str(),
            self.dst_mac.as_str(),
            self.sender_mac.as_str(),
            self.sender_ip.as_str(),
            self.target_mac.as_str(),
            self.target_ip.as_str(),
            self.op_type.as_str(),
        ]
    }

    pub fn fingerprint(&self) -> Fingerprint {
        // DefaultHasher::new() uses fixed keys, equal label sets hash equal for the life of the
        // process.
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        Fingerprint(hasher.finish())
    }
}

/// Hash of a `LabelSet`, the label cache key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u64);

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(op_type: &str) -> LabelSet {
        LabelSet {
            node: "node-a".into(),
            device: "eth0".into(),
            src_mac: "aa:bb:cc:dd:ee:ff".into(),
            dst_mac: "ff:ff:ff:ff:ff:ff".into(),
            sender_mac: "aa:bb:cc:dd:ee:ff".into(),
            sender_ip: "10.0.0.1".into(),
            target_mac: "00:00:00:00:00:00".into(),
            target_ip: "10.0.0.2".into(),
            op_type: op_type.into(),
        }
    }

    #[test]
    fn equal_label_sets_share_a_fingerprint() {
        assert_eq!(labels("Request").fingerprint(), labels("Request").fingerprint());
        assert_ne!(labels("Request").fingerprint(), labels("Reply").fingerprint());
    }

    #[test]
    fn values_follow_label_names() {
        let set = labels("Reply");
        let values = set.values();
        assert_eq!(values.len(), LABEL_NAMES.len());
        assert_eq!(values[0], "node-a");
        assert_eq!(values[5], "10.0.0.1");
        assert_eq!(values[8], "Reply");
    }
}
