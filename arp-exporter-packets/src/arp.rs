use crate::{write_hardware_addr, EthernetFrame, MacAddr, ARP_ETHER_TYPE, IPV4_ETHER_TYPE};
use std::convert::TryFrom;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// ARP operation code. Codes other than request and reply are carried through as `Unknown`,
/// nonstandard values do show up on real segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArpOp {
    Request,
    Reply,
    Unknown(u16),
}

impl ArpOp {
    pub fn code(self) -> u16 {
        match self {
            ArpOp::Request => 1,
            ArpOp::Reply => 2,
            ArpOp::Unknown(code) => code,
        }
    }
}

impl From<u16> for ArpOp {
    fn from(code: u16) -> Self {
        match code {
            1 => ArpOp::Request,
            2 => ArpOp::Reply,
            other => ArpOp::Unknown(other),
        }
    }
}

impl fmt::Display for ArpOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArpOp::Request => f.write_str("Request"),
            ArpOp::Reply => f.write_str("Reply"),
            ArpOp::Unknown(code) => write!(f, "Unknown ({})", code),
        }
    }
}

pub enum ArpHardwareType {
    Ethernet = 1,
}

const HARDWARE_TYPE_RANGE: (usize, usize) = (0, 2);
const PROTOCOL_TYPE_RANGE: (usize, usize) = (2, 4);
const HARDWARE_ADDR_LEN_RANGE: (usize, usize) = (4, 5);
const PROTOCOL_ADDR_LEN_RANGE: (usize, usize) = (5, 6);
const OPCODE_RANGE: (usize, usize) = (6, 8);

///
/// EthernetFrame wrapper with getters/setters for the packet structure described in RFC 826
/// https://tools.ietf.org/html/rfc826
///
#[derive(Clone, Debug)]
pub struct ArpFrame {
    frame: EthernetFrame,
}

impl ArpFrame {
    ///
    /// Constructs a new, empty packet with a payload big enough for all ARP fields,
    /// given some hardware/protocol address lengths. The Ethernet header carries the ARP ether
    /// type, every other header field is zero.
    ///
    pub fn new(hardware_addr_len: u8, protocol_addr_len: u8) -> Self {
        let payload_len = 8 + (2 * hardware_addr_len as usize) + (2 * protocol_addr_len as usize);
        let payload: Vec<u8> = vec![0; payload_len];

        let mut frame = EthernetFrame::empty();
        frame.set_ether_type(ARP_ETHER_TYPE);
        frame.set_payload(payload.as_slice());

        let mut arp_frame = ArpFrame { frame };
        arp_frame.set_hardware_addr_len(hardware_addr_len);
        arp_frame.set_protocol_addr_len(protocol_addr_len);
        arp_frame
    }

    ///
    /// Builds a gratuitous ARP announcement: an unsolicited reply, broadcast on the segment, in
    /// which the sender and target protocol addresses are both the announced address.
    ///
    /// Ethernet: src = `hardware_addr`, dst = ff:ff:ff:ff:ff:ff, type = ARP
    /// ARP: Ethernet/IPv4, op = Reply, sha = `hardware_addr`, spa = `ip`,
    /// tha = 00:00:00:00:00:00, tpa = `ip`
    ///
    pub fn gratuitous(hardware_addr: MacAddr, ip: Ipv4Addr) -> Self {
        let hlen = hardware_addr.bytes.len() as u8;
        let plen = ip.octets().len() as u8;

        let mut arp_frame = ArpFrame::new(hlen, plen);
        arp_frame.frame.set_src_mac(hardware_addr);
        arp_frame.frame.set_dest_mac(MacAddr::BROADCAST);

        arp_frame.set_hardware_type(ArpHardwareType::Ethernet as u16);
        arp_frame.set_protocol_type(IPV4_ETHER_TYPE);
        arp_frame.set_opcode(ArpOp::Reply.code());
        arp_frame.set_sender_hardware_addr(hardware_addr);
        arp_frame.set_sender_protocol_addr(IpAddr::V4(ip));
        arp_frame.set_target_hardware_addr(MacAddr::ZERO);
        arp_frame.set_target_protocol_addr(IpAddr::V4(ip));
        arp_frame
    }

    pub fn hardware_type(&self) -> u16 {
        let (start, end) = HARDWARE_TYPE_RANGE;
        be_u16(self.arp_data(start, end))
    }

    pub fn protocol_type(&self) -> u16 {
        let (start, end) = PROTOCOL_TYPE_RANGE;
        be_u16(self.arp_data(start, end))
    }

    pub fn hardware_addr_len(&self) -> u8 {
        let (start, _) = HARDWARE_ADDR_LEN_RANGE;
        self.arp_data(start, start + 1)[0]
    }

    pub fn protocol_addr_len(&self) -> u8 {
        let (start, _) = PROTOCOL_ADDR_LEN_RANGE;
        self.arp_data(start, start + 1)[0]
    }

    pub fn opcode(&self) -> u16 {
        let (start, end) = OPCODE_RANGE;
        be_u16(self.arp_data(start, end))
    }

    pub fn op(&self) -> ArpOp {
        ArpOp::from(self.opcode())
    }

    pub fn sender_hardware_addr(&self) -> &[u8] {
        let (start, end) = self.sender_hardware_addr_range();
        self.arp_data(start, end)
    }

    pub fn sender_protocol_addr(&self) -> &[u8] {
        let (start, end) = self.sender_protocol_addr_range();
        self.arp_data(start, end)
    }

    pub fn target_hardware_addr(&self) -> &[u8] {
        let (start, end) = self.target_hardware_addr_range();
        self.arp_data(start, end)
    }

    pub fn target_protocol_addr(&self) -> &[u8] {
        let (start, end) = self.target_protocol_addr_range();
        self.arp_data(start, end)
    }

    pub fn set_hardware_type(&mut self, htype: u16) {
        let (start, end) = HARDWARE_TYPE_RANGE;
        self.set_arp_data(&htype.to_be_bytes(), start, end);
    }

    pub fn set_protocol_type(&mut self, ptype: u16) {
        let (start, end) = PROTOCOL_TYPE_RANGE;
        self.set_arp_data(&ptype.to_be_bytes(), start, end);
    }

    pub fn set_hardware_addr_len(&mut self, len: u8) {
        let (start, end) = HARDWARE_ADDR_LEN_RANGE;
        self.set_arp_data(&len.to_be_bytes(), start, end);
    }

    pub fn set_protocol_addr_len(&mut self, len: u8) {
        let (start, end) = PROTOCOL_ADDR_LEN_RANGE;
        self.set_arp_data(&len.to_be_bytes(), start, end);
    }

    pub fn set_opcode(&mut self, code: u16) {
        let (start, end) = OPCODE_RANGE;
        self.set_arp_data(&code.to_be_bytes(), start, end);
    }

    // The address setters panic if the address does not match the length fields of the frame.
    pub fn set_sender_hardware_addr(&mut self, addr: MacAddr) {
        let (start, end) = self.sender_hardware_addr_range();
        self.set_arp_data(&addr.bytes, start, end);
    }

    pub fn set_sender_protocol_addr(&mut self, ip_addr: IpAddr) {
        let (start, end) = self.sender_protocol_addr_range();
        self.set_ip_addr(ip_addr, start, end);
    }

    pub fn set_target_hardware_addr(&mut self, addr: MacAddr) {
        let (start, end) = self.target_hardware_addr_range();
        self.set_arp_data(&addr.bytes, start, end);
    }

    pub fn set_target_protocol_addr(&mut self, ip_addr: IpAddr) {
        let (start, end) = self.target_protocol_addr_range();
        self.set_ip_addr(ip_addr, start, end);
    }

    /// The enclosing Ethernet frame.
    pub fn ethernet(&self) -> &EthernetFrame {
        &self.frame
    }

    // Move ownership of the frame back to the caller
    pub fn frame(self) -> EthernetFrame {
        self.frame
    }

    // Returns the bytes in the ethernet frame between start and end, exclusive
    fn arp_data(&self, start: usize, end: usize) -> &[u8] {
        let frame_offset_start = self.frame.payload_offset + start;
        let frame_offset_end = self.frame.payload_offset + end;
        &self.frame.data[frame_offset_start..frame_offset_end]
    }

    fn set_arp_data(&mut self, bytes: &[u8], start: usize, end: usize) {
        let frame_offset_start = self.frame.payload_offset + start;
        let frame_offset_end = self.frame.payload_offset + end;
        self.frame.data[frame_offset_start..frame_offset_end].copy_from_slice(bytes);
    }

    fn set_ip_addr(&mut self, addr: IpAddr, start: usize, end: usize) {
        match addr {
            IpAddr::V4(ipv4) => self.set_arp_data(&ipv4.octets(), start, end),
            IpAddr::V6(ipv6) => self.set_arp_data(&ipv6.octets(), start, end),
        };
    }

    fn sender_hardware_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;

        let start = 8;
        let end = start + hlen;
        (start, end)
    }
    fn sender_protocol_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;

        let start = 8 + hlen;
        let end = start + plen;
        (start, end)
    }
    fn target_hardware_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;

        let start = 8 + hlen + plen;
        let end = start + hlen;
        (start, end)
    }
    fn target_protocol_addr_range(&self) -> (usize, usize) {
        let hlen = self.hardware_addr_len() as usize;
        let plen = self.protocol_addr_len() as usize;

        let start = 8 + (2 * hlen) + plen;
        let end = start + plen;
        (start, end)
    }
}

impl TryFrom<EthernetFrame> for ArpFrame {
    type Error = &'static str;

    ///
    /// Decorates the given EthernetFrame with ArpFrame getters/setters.
    /// Validates
    /// - The frame has an ARP ether type
    /// - The frame has a payload large enough for the hardware/protocol address lengths
    ///
    /// Bytes past the last ARP field are ignored, short frames get padded up to the Ethernet
    /// minimum on the wire.
    ///
    fn try_from(frame: EthernetFrame) -> Result<Self, Self::Error> {
        if frame.ether_type() != ARP_ETHER_TYPE {
            return Err("Frame does not have ARP ether type.");
        };

        let arp_frame = ArpFrame { frame };
        let payload_len = arp_frame.frame.payload().len();

        if payload_len < 8 {
            return Err("Frame payload is too small");
        }

        let hlen = arp_frame.hardware_addr_len() as usize;
        let plen = arp_frame.protocol_addr_len() as usize;

        if payload_len < (8 + (2 * hlen) + (2 * plen)) {
            return Err("Frame payload doesn't match address length fields");
        }

        Ok(arp_frame)
    }
}

/// Renders an ARP hardware address of any length, e.g. `aa:bb:cc:dd:ee:ff`.
pub fn hardware_addr_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    // Writing into a String cannot fail
    let _ = write_hardware_addr(&mut out, bytes);
    out
}

/// Renders an ARP protocol address: dotted quad for 4 bytes and for IPv4-mapped 16 bytes, IPv6
/// text for other 16 bytes and `?` followed by hex for anything else.
pub fn protocol_addr_string(bytes: &[u8]) -> String {
    match bytes.len() {
        4 => Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]).to_string(),
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(bytes);
            let ip = Ipv6Addr::from(octets);
            match ip.to_ipv4_mapped() {
                Some(v4) => v4.to_string(),
                None => ip.to_string(),
            }
        }
        0 => String::from("<nil>"),
        _ => {
            let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            format!("?{}", hex)
        }
    }
}

fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_payload() -> Vec<u8> {
        vec![
            0x00, 0x01, 0x08, 0x00, 0x06, 0x04, 0x00, 0x01, 1, 2, 3, 4, 5, 6, 10, 0, 0, 1, 10, 9,
            8, 7, 6, 5, 10, 0, 0, 2,
        ]
    }

    #[test]
    fn generate_empty_arp_frame() {
        let arp_frame = ArpFrame::new(6, 4);
        assert_eq!(arp_frame.ethernet().ether_type(), ARP_ETHER_TYPE);
        assert_eq!(arp_frame.hardware_type(), 0);
        assert_eq!(arp_frame.protocol_type(), 0);
        assert_eq!(arp_frame.hardware_addr_len(), 6);
        assert_eq!(arp_frame.protocol_addr_len(), 4);
        assert_eq!(arp_frame.opcode(), 0);
        assert_eq!(arp_frame.sender_hardware_addr(), [0, 0, 0, 0, 0, 0]);
        assert_eq!(arp_frame.sender_protocol_addr(), [0, 0, 0, 0]);
        assert_eq!(arp_frame.target_hardware_addr(), [0, 0, 0, 0, 0, 0]);
        assert_eq!(arp_frame.target_protocol_addr(), [0, 0, 0, 0]);
    }

    #[test]
    fn arp_frame_from_ethernet() -> Result<(), String> {
        let mut ethernet_frame = EthernetFrame::empty();
        ethernet_frame.set_payload(&request_payload());
        ethernet_frame.set_ether_type(ARP_ETHER_TYPE);

        let arp_frame = ArpFrame::try_from(ethernet_frame)?;
        assert_eq!(arp_frame.hardware_type(), 1);
        assert_eq!(arp_frame.protocol_type(), IPV4_ETHER_TYPE);
        assert_eq!(arp_frame.hardware_addr_len(), 6);
        assert_eq!(arp_frame.protocol_addr_len(), 4);
        assert_eq!(arp_frame.op(), ArpOp::Request);
        assert_eq!(arp_frame.sender_hardware_addr(), [1, 2, 3, 4, 5, 6]);
        assert_eq!(arp_frame.sender_protocol_addr(), [10, 0, 0, 1]);
        assert_eq!(arp_frame.target_hardware_addr(), [10, 9, 8, 7, 6, 5]);
        assert_eq!(arp_frame.target_protocol_addr(), [10, 0, 0, 2]);
        Ok(())
    }

    #[test]
    fn padded_frame_is_accepted() {
        let mut payload = request_payload();
        payload.resize(46, 0);
        let mut ethernet_frame = EthernetFrame::empty();
        ethernet_frame.set_payload(&payload);
        ethernet_frame.set_ether_type(ARP_ETHER_TYPE);

        let arp_frame = ArpFrame::try_from(ethernet_frame).unwrap();
        assert_eq!(arp_frame.target_protocol_addr(), [10, 0, 0, 2]);
    }

    #[test]
    fn rejects_non_arp_and_truncated() {
        let mut ipv4 = EthernetFrame::empty();
        ipv4.set_ether_type(IPV4_ETHER_TYPE);
        ipv4.set_payload(&request_payload());
        assert_eq!(
            ArpFrame::try_from(ipv4).unwrap_err(),
            "Frame does not have ARP ether type."
        );

        let mut tiny = EthernetFrame::empty();
        tiny.set_ether_type(ARP_ETHER_TYPE);
        tiny.set_payload(&[0, 1, 8, 0]);
        assert_eq!(
            ArpFrame::try_from(tiny).unwrap_err(),
            "Frame payload is too small"
        );

        let mut truncated = EthernetFrame::empty();
        truncated.set_ether_type(ARP_ETHER_TYPE);
        truncated.set_payload(&request_payload()[..20]);
        assert_eq!(
            ArpFrame::try_from(truncated).unwrap_err(),
            "Frame payload doesn't match address length fields"
        );
    }

    #[test]
    fn gratuitous_announcement() {
        let mac = MacAddr::new([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        let ip = Ipv4Addr::new(192, 168, 1, 50);
        let garp = ArpFrame::gratuitous(mac, ip);

        let ethernet = garp.ethernet();
        assert_eq!(ethernet.dest_mac(), MacAddr::BROADCAST);
        assert_eq!(ethernet.src_mac(), mac);
        assert_eq!(ethernet.ether_type(), ARP_ETHER_TYPE);
        assert_eq!(ethernet.as_bytes().len(), 14 + 28);

        assert_eq!(garp.hardware_type(), ArpHardwareType::Ethernet as u16);
        assert_eq!(garp.protocol_type(), IPV4_ETHER_TYPE);
        assert_eq!(garp.hardware_addr_len(), 6);
        assert_eq!(garp.protocol_addr_len(), 4);
        assert_eq!(garp.op(), ArpOp::Reply);
        assert_eq!(garp.sender_hardware_addr(), mac.bytes);
        assert_eq!(garp.sender_protocol_addr(), [192, 168, 1, 50]);
        assert_eq!(garp.target_hardware_addr(), MacAddr::ZERO.bytes);
        assert_eq!(garp.target_protocol_addr(), [192, 168, 1, 50]);

        // Survives a trip through the parser unchanged
        let reparsed = ArpFrame::try_from(garp.clone().frame()).unwrap();
        assert_eq!(reparsed.ethernet(), garp.ethernet());
    }

    #[test]
    fn op_codes() {
        assert_eq!(ArpOp::from(1), ArpOp::Request);
        assert_eq!(ArpOp::from(2), ArpOp::Reply);
        assert_eq!(ArpOp::from(9), ArpOp::Unknown(9));
        assert_eq!(ArpOp::Request.to_string(), "Request");
        assert_eq!(ArpOp::Reply.to_string(), "Reply");
        assert_eq!(ArpOp::Unknown(9).to_string(), "Unknown (9)");
        assert_eq!(ArpOp::Unknown(9).code(), 9);
    }

    #[test]
    fn address_strings() {
        assert_eq!(hardware_addr_string(&[0xaa, 0, 0x0b]), "aa:00:0b");
        assert_eq!(protocol_addr_string(&[192, 168, 1, 50]), "192.168.1.50");
        let mut v6 = [0u8; 16];
        v6[0] = 0x20;
        v6[1] = 0x01;
        v6[2] = 0x0d;
        v6[3] = 0xb8;
        v6[15] = 1;
        assert_eq!(protocol_addr_string(&v6), "2001:db8::1");
        assert_eq!(protocol_addr_string(&[1, 2, 0xff]), "?0102ff");
        assert_eq!(protocol_addr_string(&[]), "<nil>");
    }

    #[test]
    fn mapped_ipv4_renders_dotted() {
        let mut mapped = [0u8; 16];
        mapped[10] = 0xff;
        mapped[11] = 0xff;
        mapped[12..].copy_from_slice(&[10, 0, 0, 7]);
        assert_eq!(protocol_addr_string(&mapped), "10.0.0.7");
    }
}
