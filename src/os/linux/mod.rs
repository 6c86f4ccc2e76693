pub mod enumerate;
pub mod usbfs;
