//! Host network configuration for a VM provisioning agent.
//!
//! Turns a settings document of named networks into the host's native
//! configuration: a DHCP client config, static interface definitions and
//! `resolv.conf`. The relevant services are bounced and new static
//! addresses are announced with gratuitous ARP.
//!
//! All host access goes through the [`system::FileSystem`] and
//! [`system::CmdRunner`] ports; [`system::fakes`] provides in-memory doubles.

pub mod error;
pub mod net;
pub mod platform;
pub mod settings;
pub mod system;

pub use error::{Error, Result};
pub use platform::{LinuxPlatform, Platform};
pub use settings::{Network, Networks, Settings};
