use std::fmt;
use std::slice::Iter;

/// Length of a standard USB device descriptor.
pub const DEVICE_DESCRIPTOR_LENGTH: usize = 18;

/// Standard USB device descriptor, parsed from the raw bytes usbfs returns
/// when reading a device node. Only `id_vendor`/`id_product` take part in
/// matching; the rest is kept for diagnostics.
pub struct Device {
    pub length: u8,
    pub kind: u8,
    pub bcd_usb: u16,
    pub device_class: u8,
    pub device_sub_class: u8,
    pub device_protocol: u8,
    pub max_packet_size0: u8,
    pub id_vendor: u16,
    pub id_product: u16,
    pub bcd_device: u16,
    pub imanufacturer: u8,
    pub iproduct: u8,
    pub iserial: u8,
    pub num_configurations: u8,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut d = format!("bLength: {}\n", self.length);
        d += &format!("bDescriptorType: {}\n", self.kind);
        d += &format!("bcdUsb: 0x{:04x}\n", self.bcd_usb);
        d += &format!("bDeviceClass: {}\n", self.device_class);
        d += &format!("bDeviceSubClass: {}\n", self.device_sub_class);
        d += &format!("bDeviceProtocol: {}\n", self.device_protocol);
        d += &format!("bMaxPacketSize: {}\n", self.max_packet_size0);
        d += &format!("idVendor: 0x{:04x}\n", self.id_vendor);
        d += &format!("idProduct: 0x{:04x}\n", self.id_product);
        d += &format!("bcdDevice: 0x{:04x}\n", self.bcd_device);
        d += &format!("iManufacturer: {}\n", self.imanufacturer);
        d += &format!("iProduct: {}\n", self.iproduct);
        d += &format!("iSerialNumber: {}\n", self.iserial);
        d += &format!("bNumConfigurations: {}\n", self.num_configurations);
        write!(f, "{}", d)
    }
}

impl Device {
    /// Parse the descriptor at the start of `raw`. `None` if the buffer is
    /// shorter than a device descriptor.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        Self::parse(&mut raw.iter())
    }

    fn parse(iter: &mut Iter<u8>) -> Option<Self> {
        Some(Device {
            length: *iter.next()?,
            kind: *iter.next()?,
            bcd_usb: *iter.next()? as u16 | (*iter.next()? as u16) << 8,
            device_class: *iter.next()?,
            device_sub_class: *iter.next()?,
            device_protocol: *iter.next()?,
            max_packet_size0: *iter.next()?,
            id_vendor: *iter.next()? as u16 | (*iter.next()? as u16) << 8,
            id_product: *iter.next()? as u16 | (*iter.next()? as u16) << 8,
            bcd_device: *iter.next()? as u16 | (*iter.next()? as u16) << 8,
            imanufacturer: *iter.next()?,
            iproduct: *iter.next()?,
            iserial: *iter.next()?,
            num_configurations: *iter.next()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(vendor: u16, product: u16) -> [u8; DEVICE_DESCRIPTOR_LENGTH] {
        let mut d = [0u8; DEVICE_DESCRIPTOR_LENGTH];
        d[0] = DEVICE_DESCRIPTOR_LENGTH as u8;
        d[1] = 1; // device descriptor
        d[2] = 0x00;
        d[3] = 0x02; // bcdUSB 2.0
        d[7] = 64; // bMaxPacketSize0
        d[8] = (vendor & 0xff) as u8;
        d[9] = (vendor >> 8) as u8;
        d[10] = (product & 0xff) as u8;
        d[11] = (product >> 8) as u8;
        d[17] = 1;
        d
    }

    #[test]
    fn parses_ids_little_endian() {
        let device = Device::from_bytes(&raw(0x0bb4, 0x0fff)).unwrap();
        assert_eq!(device.length, 18);
        assert_eq!(device.kind, 1);
        assert_eq!(device.bcd_usb, 0x0200);
        assert_eq!(device.max_packet_size0, 64);
        assert_eq!(device.id_vendor, 0x0bb4);
        assert_eq!(device.id_product, 0x0fff);
        assert_eq!(device.num_configurations, 1);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut padded = [0u8; 64];
        padded[..DEVICE_DESCRIPTOR_LENGTH].copy_from_slice(&raw(0x1234, 0x5678));
        let device = Device::from_bytes(&padded).unwrap();
        assert_eq!(device.id_vendor, 0x1234);
        assert_eq!(device.id_product, 0x5678);
    }

    #[test]
    fn short_buffer_is_rejected() {
        assert!(Device::from_bytes(&[18, 1, 0, 2]).is_none());
        assert!(Device::from_bytes(&[]).is_none());
    }
}
