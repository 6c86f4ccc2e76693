use crate::endpoint::Endpoint;
use crate::fastboot::DeviceId;
use nix::errno::Errno;
use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The outer bus namespace could not be listed at all. Fatal for a scan.
    #[error("cannot list usb namespace {}: {}", .path.display(), .source)]
    NamespaceUnavailable { path: PathBuf, source: io::Error },

    /// Scan finished without a matching, claimable device.
    #[error("no usb device matched {0}")]
    DeviceNotFound(DeviceId),

    #[error("could not claim interface {interface}: {source}")]
    InterfaceClaim { interface: u32, source: Errno },

    /// A handle whose output endpoint is not bulk-out never issues a transfer.
    #[error("{0} is not a writable bulk endpoint")]
    EndpointNotWritable(Endpoint),

    #[error("bulk transfer on {endpoint} failed at offset {offset}: {source}")]
    Transport {
        endpoint: Endpoint,
        offset: usize,
        source: Errno,
    },

    #[error("short bulk write at offset {offset}: device took {transferred} of {requested} bytes")]
    ShortWrite {
        offset: usize,
        requested: usize,
        transferred: usize,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
