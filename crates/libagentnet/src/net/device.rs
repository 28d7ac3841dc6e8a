//! Mapping hardware addresses to interface names.

use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::system::FileSystem;

/// Resolves a network definition's MAC address to an OS interface name.
pub trait DeviceResolver: Send + Sync {
    fn resolve_by_mac(&self, mac: &str) -> Result<String>;
}

/// Scans the sysfs device namespace (`/sys/class/net/*/address`).
///
/// When several devices carry the same address the first entry in sorted
/// glob order wins.
pub struct SysfsDeviceResolver {
    fs: Arc<dyn FileSystem>,
    device_glob: String,
    address_attr: String,
}

impl SysfsDeviceResolver {
    pub fn new(fs: Arc<dyn FileSystem>, device_glob: &str, address_attr: &str) -> Self {
        Self {
            fs,
            device_glob: device_glob.to_string(),
            address_attr: address_attr.to_string(),
        }
    }
}

impl DeviceResolver for SysfsDeviceResolver {
    fn resolve_by_mac(&self, mac: &str) -> Result<String> {
        let wanted = mac.trim();
        if wanted.is_empty() {
            return Err(Error::InterfaceNotFound {
                mac: mac.to_string(),
            });
        }

        for entry in self.fs.glob(&self.device_glob)? {
            let attr = entry.join(&self.address_attr);
            let address = match self.fs.read_file(&attr) {
                Ok(Some(address)) => address,
                Ok(None) => continue,
                Err(e) => {
                    log::debug!("Skipping {}: {}", entry.display(), e);
                    continue;
                }
            };
            if address.trim().eq_ignore_ascii_case(wanted) {
                let name = short_name(&entry);
                log::debug!("MAC {wanted} resolved to interface {name}");
                return Ok(name);
            }
        }

        Err(Error::InterfaceNotFound {
            mac: mac.to_string(),
        })
    }
}

fn short_name(entry: &Path) -> String {
    entry
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.display().to_string())
}
