use arp_exporter_packets::MacAddr;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("invalid interface name {device:?}")]
    InvalidName { device: String },
    #[error("error getting hardware address of {device}: {source}")]
    Lookup {
        device: String,
        #[source]
        source: io::Error,
    },
    #[error("interface {device} does not have an Ethernet hardware address")]
    NotEthernet { device: String },
}

/// Looks up the hardware address of `device` with the `SIOCGIFHWADDR` ioctl.
#[cfg(target_os = "linux")]
pub fn hardware_addr(device: &str) -> Result<MacAddr, InterfaceError> {
    use crate::io::linux;
    use std::mem::MaybeUninit;
    use std::ptr;

    let invalid_name = || InterfaceError::InvalidName {
        device: device.to_string(),
    };
    let name = std::ffi::CString::new(device).map_err(|_| invalid_name())?;
    let name = name.as_bytes_with_nul();
    if name.len() > libc::IFNAMSIZ {
        return Err(invalid_name());
    }
    let lookup_error = |source| InterfaceError::Lookup {
        device: device.to_string(),
        source,
    };

    // The ifreq is zeroed and the name copy is bounded by IFNAMSIZ, the socket is closed on
    // every path after it is opened.
    let hwaddr = unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0);
        if fd < 0 {
            return Err(lookup_error(io::Error::last_os_error()));
        }

        let mut ifr: linux::ifreq = MaybeUninit::zeroed().assume_init();
        ptr::copy_nonoverlapping(
            name.as_ptr() as *const libc::c_char,
            ifr.ifr_ifrn.ifrn_name.as_mut_ptr(),
            name.len(),
        );
        // man 7 netdevice
        let err = libc::ioctl(fd, linux::SIOCGIFHWADDR, &mut ifr as *mut linux::ifreq);
        let ioctl_error = io::Error::last_os_error();
        libc::close(fd);
        if err < 0 {
            return Err(lookup_error(ioctl_error));
        }
        ifr.ifr_ifru.ifru_hwaddr
    };

    if hwaddr.sa_family != libc::ARPHRD_ETHER {
        return Err(InterfaceError::NotEthernet {
            device: device.to_string(),
        });
    }

    let mut bytes = [0u8; 6];
    for (byte, data) in bytes.iter_mut().zip(hwaddr.sa_data.iter()) {
        *byte = *data as u8;
    }
    Ok(MacAddr::new(bytes))
}

#[cfg(not(target_os = "linux"))]
pub fn hardware_addr(device: &str) -> Result<MacAddr, InterfaceError> {
    Err(InterfaceError::Lookup {
        device: device.to_string(),
        source: io::Error::new(
            io::ErrorKind::Unsupported,
            "hardware address lookup is only implemented for Linux",
        ),
    })
}

/// The host name of this machine, used as the `node` label.
pub fn hostname() -> io::Result<String> {
    let mut buf = [0u8; 256];
    let err = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if err < 0 {
        return Err(io::Error::last_os_error());
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
}
