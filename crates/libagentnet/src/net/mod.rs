//! Network configuration for the supported OS families.

pub mod address;
pub mod arp;
pub mod device;
pub mod dhcp;
pub mod layout;
pub mod manager;
pub mod manual;

pub use arp::{ArpAnnouncer, ArpTarget, DEFAULT_ARP_INTERVAL, DEFAULT_ARP_ROUNDS};
pub use device::{DeviceResolver, SysfsDeviceResolver};
pub use dhcp::DhcpConfigurator;
pub use layout::{OsFamily, OsLayout};
pub use manager::{LinuxNetManager, NetManager};
pub use manual::StaticInterfaceConfigurator;
