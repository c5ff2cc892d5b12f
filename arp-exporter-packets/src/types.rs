use std::fmt;
use std::fmt::Write as _;

pub type PacketData = Vec<u8>;

pub const ARP_ETHER_TYPE: u16 = 0x0806;
pub const IPV4_ETHER_TYPE: u16 = 0x0800;

//Most significant byte is 0th
#[derive(Eq, Clone, Copy, Hash, PartialEq, Default)]
pub struct MacAddr {
    pub bytes: [u8; 6],
}

impl MacAddr {
    /// ff:ff:ff:ff:ff:ff
    pub const BROADCAST: MacAddr = MacAddr { bytes: [0xff; 6] };

    /// 00:00:00:00:00:00
    pub const ZERO: MacAddr = MacAddr { bytes: [0; 6] };

    pub fn new(bytes: [u8; 6]) -> MacAddr {
        MacAddr { bytes }
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddr::new(bytes)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_hardware_addr(f, &self.bytes)
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MacAddr({})", self)
    }
}

/// Writes hardware address bytes of any length as colon separated lower-case hex.
pub fn write_hardware_addr(f: &mut dyn fmt::Write, bytes: &[u8]) -> fmt::Result {
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            f.write_char(':')?;
        }
        write!(f, "{:02x}", byte)?;
    }
    Ok(())
}
