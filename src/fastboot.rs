use crate::descriptor::Device;
use crate::endpoint::Endpoint;
use std::fmt;

/// Vendor/product pair a candidate descriptor is matched against.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DeviceId {
    pub vendor: u16,
    pub product: u16,
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor, self.product)
    }
}

impl DeviceId {
    pub fn matches(&self, device: &Device) -> bool {
        device.id_vendor == self.vendor && device.id_product == self.product
    }
}

/// Per-class conventions: which device to look for, which interface to claim
/// and which bulk endpoints it exposes. Endpoint addresses are fixed by the
/// class convention, not read from configuration descriptors.
#[derive(Clone, Copy, Debug)]
pub struct ClassProfile {
    pub id: DeviceId,
    pub interface: u32,
    pub ep_in: Endpoint,
    pub ep_out: Endpoint,
}

/// HTC fastboot bootloader: interface 1, bulk endpoints 0x81/0x01.
pub const FASTBOOT: ClassProfile = ClassProfile {
    id: DeviceId {
        vendor: 0x0bb4,
        product: 0x0fff,
    },
    interface: 1,
    ep_in: Endpoint::bulk_in(1),
    ep_out: Endpoint::bulk_out(1),
};

/// Command a fastboot bootloader answers by rebooting into fastboot mode.
pub const REBOOT_BOOTLOADER: &str = "reboot-bootloader";
