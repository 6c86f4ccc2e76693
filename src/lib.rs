pub mod descriptor;
pub mod endpoint;
pub mod error;
pub mod fastboot;
pub mod os;
pub mod transport;

pub use endpoint::Endpoint;
pub use error::Error;
pub use fastboot::{ClassProfile, DeviceId, FASTBOOT, REBOOT_BOOTLOADER};
#[cfg(target_os = "linux")]
pub use os::linux::enumerate::{candidates, find, scan, Candidate, Match, USB_NAMESPACE};
#[cfg(target_os = "linux")]
pub use os::linux::usbfs::{DeviceHandle, UsbFs};
pub use transport::{BulkChannel, Termination, MAX_BULK_TRANSACTION};
