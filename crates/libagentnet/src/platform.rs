//! Agent-facing platform facade.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::net::{LinuxNetManager, NetManager, OsFamily, OsLayout};
use crate::settings::Networks;
use crate::system::{CmdRunner, FileSystem};

pub trait Platform: Send + Sync {
    fn setup_dhcp(&self, networks: &Networks) -> Result<()>;

    /// Configure static networks. Returns once files are written and
    /// interfaces restarted; the ARP burst continues in the background.
    fn setup_manual_networking(&self, networks: &Networks) -> Result<()>;

    fn file_system(&self) -> Arc<dyn FileSystem>;
    fn cmd_runner(&self) -> Arc<dyn CmdRunner>;
}

pub struct LinuxPlatform {
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CmdRunner>,
    net_manager: Box<dyn NetManager>,
}

impl LinuxPlatform {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CmdRunner>,
        net_manager: Box<dyn NetManager>,
    ) -> Self {
        Self {
            fs,
            runner,
            net_manager,
        }
    }

    /// Compose the standard network manager for `family`.
    pub fn for_os(
        family: OsFamily,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CmdRunner>,
        arp_interval: Duration,
    ) -> Self {
        let manager = LinuxNetManager::new(
            OsLayout::for_family(family),
            Arc::clone(&fs),
            Arc::clone(&runner),
            arp_interval,
        );
        Self::new(fs, runner, Box::new(manager))
    }

    /// See [`NetManager::arp_burst_duration`].
    pub fn arp_burst_duration(&self) -> Duration {
        self.net_manager.arp_burst_duration()
    }

    /// See [`NetManager::wait_for_announcements`].
    pub fn wait_for_announcements(&self, timeout: Duration) -> bool {
        self.net_manager.wait_for_announcements(timeout)
    }
}

impl Platform for LinuxPlatform {
    fn setup_dhcp(&self, networks: &Networks) -> Result<()> {
        log::info!("Setting up DHCP networking");
        self.net_manager.setup_dhcp(networks)
    }

    fn setup_manual_networking(&self, networks: &Networks) -> Result<()> {
        log::info!("Setting up manual networking");
        self.net_manager.setup_manual_networking(networks)
    }

    fn file_system(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    fn cmd_runner(&self) -> Arc<dyn CmdRunner> {
        Arc::clone(&self.runner)
    }
}
