use crate::descriptor::{Device, DEVICE_DESCRIPTOR_LENGTH};
use crate::error::Error;
use crate::fastboot::{ClassProfile, DeviceId};
use crate::os::linux::usbfs::{DeviceHandle, UsbFs};
use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions, ReadDir};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where usbdevfs exposes attached devices: one directory per bus, one node
/// per device, both named with decimal digits.
pub const USB_NAMESPACE: &str = "/dev/bus/usb";

/// One entry of the two-level bus/device namespace.
pub struct Candidate {
    pub bus: u8,
    pub dev: u8,
    pub path: PathBuf,
}

/// A candidate whose descriptor matched. The file the descriptor was read
/// from stays open and becomes the transfer channel.
pub struct Match {
    pub candidate: Candidate,
    pub device: Device,
    pub(crate) channel: File,
}

/// Accept only names made of decimal digits. Anything else under the
/// namespace (".", control nodes, hotplug leftovers) is not a device.
fn numeric_name(name: &OsStr) -> Option<u8> {
    let name = name.to_str()?;
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Lazy walk over all bus/device nodes under `root`. Listing the root is the
/// only fatal failure; a bus that cannot be listed is logged and skipped.
pub fn candidates(root: &Path) -> Result<Candidates, Error> {
    let buses = fs::read_dir(root).map_err(|source| Error::NamespaceUnavailable {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(Candidates {
        buses,
        devices: None,
    })
}

pub struct Candidates {
    buses: ReadDir,
    devices: Option<(u8, ReadDir)>,
}

impl Iterator for Candidates {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            if let Some((bus, devices)) = self.devices.as_mut() {
                for entry in devices {
                    let entry = match entry {
                        Ok(e) => e,
                        Err(e) => {
                            log::warn!("unreadable device entry: {}", e);
                            continue;
                        }
                    };
                    if let Some(dev) = numeric_name(&entry.file_name()) {
                        return Some(Candidate {
                            bus: *bus,
                            dev,
                            path: entry.path(),
                        });
                    }
                }
                self.devices = None;
            }

            let entry = match self.buses.next()? {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("unreadable bus entry: {}", e);
                    continue;
                }
            };
            let bus = match numeric_name(&entry.file_name()) {
                Some(bus) => bus,
                None => continue,
            };
            match fs::read_dir(entry.path()) {
                Ok(devices) => self.devices = Some((bus, devices)),
                Err(e) => log::warn!("cannot list bus {:03}: {}", bus, e),
            }
        }
    }
}

/// Lazy scan yielding every candidate whose device descriptor matches `id`.
/// Candidates that cannot be opened or read are logged and skipped.
pub fn scan(root: &Path, id: DeviceId) -> Result<impl Iterator<Item = Match>, Error> {
    let all = candidates(root)?;
    Ok(all.filter_map(move |candidate| probe(candidate, id)))
}

fn probe(candidate: Candidate, id: DeviceId) -> Option<Match> {
    let mut channel = match OpenOptions::new().read(true).write(true).open(&candidate.path) {
        Ok(file) => file,
        Err(e) => {
            log::debug!("cannot open {}: {}", candidate.path.display(), e);
            return None;
        }
    };

    let mut raw = [0u8; 1024];
    let n = match channel.read(&mut raw) {
        Ok(n) => n,
        Err(e) => {
            log::debug!("cannot read {}: {}", candidate.path.display(), e);
            return None;
        }
    };
    if n < DEVICE_DESCRIPTOR_LENGTH {
        log::debug!(
            "{}: {} descriptor bytes, expected at least {}",
            candidate.path.display(),
            n,
            DEVICE_DESCRIPTOR_LENGTH
        );
        return None;
    }

    let device = Device::from_bytes(&raw[..n])?;
    log::debug!(
        "{:03}/{:03}: {:04x}:{:04x}",
        candidate.bus,
        candidate.dev,
        device.id_vendor,
        device.id_product
    );
    if !id.matches(&device) {
        return None;
    }
    Some(Match {
        candidate,
        device,
        channel,
    })
}

/// Locate the first device matching `profile` and claim its interface.
/// First match wins; a match whose interface cannot be claimed is closed and
/// scanning continues. Exhausting the namespace is `DeviceNotFound`.
pub fn find(root: &Path, profile: &ClassProfile, timeout: Duration) -> Result<DeviceHandle, Error> {
    for matched in scan(root, profile.id)? {
        let Match {
            candidate, channel, ..
        } = matched;
        let mut usb = UsbFs::new(channel, candidate.bus, candidate.dev, timeout);
        match usb.claim_interface(profile.interface) {
            Ok(()) => {
                log::info!(
                    "found {} at bus {:03} device {:03}",
                    profile.id,
                    candidate.bus,
                    candidate.dev
                );
                return Ok(DeviceHandle::new(usb, profile));
            }
            Err(source) => {
                // Dropping the handle closes the channel; keep scanning.
                log::warn!(
                    "{}",
                    Error::InterfaceClaim {
                        interface: profile.interface,
                        source,
                    }
                );
            }
        }
    }
    Err(Error::DeviceNotFound(profile.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fastboot::FASTBOOT;
    use std::io::Write;

    /// Scratch directory shaped like /dev/bus/usb, removed on drop.
    struct Scratch {
        root: PathBuf,
    }

    impl Scratch {
        fn new(tag: &str) -> Self {
            let root = std::env::temp_dir().join(format!("fbsend-{}-{}", tag, std::process::id()));
            let _ = fs::remove_dir_all(&root);
            fs::create_dir_all(&root).unwrap();
            Scratch { root }
        }

        fn bus(&self, name: &str) -> PathBuf {
            let dir = self.root.join(name);
            fs::create_dir_all(&dir).unwrap();
            dir
        }

        fn device(&self, bus: &str, dev: &str, raw: &[u8]) {
            let dir = self.bus(bus);
            let mut file = File::create(dir.join(dev)).unwrap();
            file.write_all(raw).unwrap();
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    fn descriptor(vendor: u16, product: u16) -> [u8; DEVICE_DESCRIPTOR_LENGTH] {
        let mut raw = [0u8; DEVICE_DESCRIPTOR_LENGTH];
        raw[0] = DEVICE_DESCRIPTOR_LENGTH as u8;
        raw[1] = 1;
        raw[8] = (vendor & 0xff) as u8;
        raw[9] = (vendor >> 8) as u8;
        raw[10] = (product & 0xff) as u8;
        raw[11] = (product >> 8) as u8;
        raw
    }

    #[test]
    fn digit_only_names_are_walked() {
        let scratch = Scratch::new("digits");
        scratch.device("001", "001", &descriptor(0x1234, 0x0001));
        scratch.device("001", "002", &descriptor(0x1234, 0x0002));
        scratch.device("002", "001", &descriptor(0x1234, 0x0003));
        scratch.device("usb-control", "001", &descriptor(0x1234, 0x0004));
        scratch.device("001", "devices", &descriptor(0x1234, 0x0005));
        scratch.bus("00a");

        let mut found: Vec<(u8, u8)> = candidates(&scratch.root)
            .unwrap()
            .map(|c| (c.bus, c.dev))
            .collect();
        found.sort();
        assert_eq!(found, vec![(1, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn scan_skips_mismatches_and_keeps_the_match() {
        let scratch = Scratch::new("scan");
        scratch.device("001", "001", &descriptor(0x1234, 0x0001));
        scratch.device("001", "002", &descriptor(0x0bb4, 0x0fff));

        let matches: Vec<Match> = scan(&scratch.root, FASTBOOT.id).unwrap().collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].candidate.dev, 2);
        assert_eq!(matches[0].device.id_vendor, 0x0bb4);
        assert_eq!(matches[0].device.id_product, 0x0fff);
    }

    #[test]
    fn truncated_descriptor_does_not_match() {
        let scratch = Scratch::new("short");
        scratch.device("001", "001", &descriptor(0x0bb4, 0x0fff)[..8]);

        assert_eq!(scan(&scratch.root, FASTBOOT.id).unwrap().count(), 0);
    }

    #[test]
    fn empty_namespace_reports_not_found() {
        let scratch = Scratch::new("empty");
        let err = find(&scratch.root, &FASTBOOT, Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(_)));
    }

    #[test]
    fn missing_namespace_is_fatal() {
        let root = std::env::temp_dir().join("fbsend-does-not-exist");
        let err = candidates(&root).err().unwrap();
        assert!(matches!(err, Error::NamespaceUnavailable { .. }));
    }

    #[test]
    fn unclaimable_match_is_skipped_not_returned() {
        // A plain file matches the descriptor but rejects the claim ioctl,
        // so find must keep scanning and end with DeviceNotFound.
        let scratch = Scratch::new("claim");
        scratch.device("001", "002", &descriptor(0x0bb4, 0x0fff));

        let err = find(&scratch.root, &FASTBOOT, Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, Error::DeviceNotFound(_)));
    }

    #[test]
    fn numeric_name_filter() {
        assert_eq!(numeric_name(OsStr::new("001")), Some(1));
        assert_eq!(numeric_name(OsStr::new("127")), Some(127));
        assert_eq!(numeric_name(OsStr::new("")), None);
        assert_eq!(numeric_name(OsStr::new(".")), None);
        assert_eq!(numeric_name(OsStr::new("1a")), None);
        assert_eq!(numeric_name(OsStr::new("-1")), None);
        // out of device-number range
        assert_eq!(numeric_name(OsStr::new("999")), None);
    }
}
