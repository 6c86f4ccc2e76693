use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::fastboot::ClassProfile;
use crate::transport::{self, BulkChannel, Termination};
use nix::errno::Errno;
use nix::{ioctl_read, ioctl_readwrite, ioctl_write_ptr, request_code_none};
use std::ffi::CStr;
use std::fmt;
use std::fs::File;
use std::mem;
use std::os::unix::io::AsRawFd;
use std::ptr;
use std::time::Duration;

// Sync bulk transfer
#[repr(C)]
pub struct BulkTransfer {
    ep: u32,
    length: u32,
    timeout: u32,
    data: *mut libc::c_void,
}

#[repr(C)]
pub struct UsbFsGetDriver {
    interface: i32,
    driver: [libc::c_char; 256],
}

#[repr(C)]
pub struct UsbFsIoctl {
    interface: i32,
    code: i32,
    data: *mut libc::c_void,
}

ioctl_readwrite!(usb_bulk_transfer, b'U', 2, BulkTransfer);
ioctl_write_ptr!(usb_get_driver, b'U', 8, UsbFsGetDriver);
ioctl_read!(usb_claim_interface, b'U', 15, u32);
ioctl_read!(usb_release_interface, b'U', 16, u32);
ioctl_readwrite!(usb_ioctl, b'U', 18, UsbFsIoctl);

/// An open usbfs device node. Claimed interfaces are released again on drop.
#[derive(Debug)]
pub struct UsbFs {
    handle: File,
    bus_dev: (u8, u8),
    claims: Vec<u32>,
    timeout: Duration,
}

impl UsbFs {
    pub(crate) fn new(handle: File, bus: u8, dev: u8, timeout: Duration) -> Self {
        UsbFs {
            handle,
            bus_dev: (bus, dev),
            claims: vec![],
            timeout,
        }
    }

    pub fn bus_dev(&self) -> (u8, u8) {
        self.bus_dev
    }

    /// Claim `interface`. A kernel driver still bound to it is detached
    /// first, otherwise the claim comes back EBUSY.
    pub fn claim_interface(&mut self, interface: u32) -> Result<(), Errno> {
        let mut driver: UsbFsGetDriver = unsafe { mem::zeroed() };
        driver.interface = interface as i32;
        if unsafe { usb_get_driver(self.handle.as_raw_fd(), &driver) }.is_ok() {
            let name = unsafe { CStr::from_ptr(driver.driver.as_ptr()) };
            if name.to_bytes() != b"usbfs" {
                let mut disconnect = UsbFsIoctl {
                    interface: interface as i32,
                    code: request_code_none!(b'U', 22) as i32,
                    data: ptr::null_mut(),
                };
                if let Err(e) = unsafe { usb_ioctl(self.handle.as_raw_fd(), &mut disconnect) } {
                    log::debug!("driver disconnect on interface {} failed: {}", interface, e);
                }
            }
        }

        let mut interface_arg = interface;
        unsafe { usb_claim_interface(self.handle.as_raw_fd(), &mut interface_arg) }?;
        self.claims.push(interface);
        Ok(())
    }

    pub fn release_interface(&self, interface: u32) -> Result<(), Errno> {
        let mut interface = interface;
        unsafe { usb_release_interface(self.handle.as_raw_fd(), &mut interface) }?;
        Ok(())
    }
}

impl BulkChannel for UsbFs {
    fn bulk_out(&mut self, ep: Endpoint, data: &[u8]) -> Result<usize, Errno> {
        let mut bulk = BulkTransfer {
            ep: u8::from(ep) as u32,
            length: data.len() as u32,
            timeout: self.timeout.as_millis() as u32,
            data: data.as_ptr() as *mut libc::c_void,
        };

        let n = unsafe { usb_bulk_transfer(self.handle.as_raw_fd(), &mut bulk) }?;
        Ok(n as usize)
    }
}

impl Drop for UsbFs {
    fn drop(&mut self) {
        for claim in &self.claims {
            if let Err(e) = self.release_interface(*claim) {
                log::debug!("release of interface {} failed: {}", claim, e);
            }
        }
    }
}

/// A matched, claimed device ready for bulk traffic. Only successful
/// discovery constructs one, so the channel behind it is always open and the
/// interface claimed.
#[derive(Debug)]
pub struct DeviceHandle {
    usb: UsbFs,
    ep_in: Endpoint,
    ep_out: Endpoint,
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (bus, dev) = self.usb.bus_dev();
        write!(f, "bus {:03} device {:03}", bus, dev)
    }
}

impl DeviceHandle {
    pub(crate) fn new(usb: UsbFs, profile: &ClassProfile) -> Self {
        DeviceHandle {
            usb,
            ep_in: profile.ep_in,
            ep_out: profile.ep_out,
        }
    }

    pub fn bus_dev(&self) -> (u8, u8) {
        self.usb.bus_dev()
    }

    pub fn endpoint_in(&self) -> Endpoint {
        self.ep_in
    }

    pub fn endpoint_out(&self) -> Endpoint {
        self.ep_out
    }

    /// Send `payload` to the device's bulk-out endpoint. See
    /// [`transport::send`] for the chunking and termination contract.
    pub fn send(&mut self, payload: &[u8], termination: Termination) -> Result<usize, Error> {
        let ep = self.ep_out;
        transport::send(&mut self.usb, ep, payload, termination)
    }
}
