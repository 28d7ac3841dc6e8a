//! OS-specific network manager.
//!
//! The OS family is chosen once when the manager is built; from then on the
//! two setup operations only see an [`OsLayout`].

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::net::arp::ArpAnnouncer;
use crate::net::device::{DeviceResolver, SysfsDeviceResolver};
use crate::net::dhcp::DhcpConfigurator;
use crate::net::layout::OsLayout;
use crate::net::manual::StaticInterfaceConfigurator;
use crate::settings::{Networks, static_networks};
use crate::system::{CmdRunner, FileSystem};

pub trait NetManager: Send + Sync {
    fn setup_dhcp(&self, networks: &Networks) -> Result<()>;
    fn setup_manual_networking(&self, networks: &Networks) -> Result<()>;

    /// Nominal length of an ARP burst started by `setup_manual_networking`.
    /// It is not a bound on the real length.
    fn arp_burst_duration(&self) -> Duration {
        Duration::ZERO
    }

    /// Block until background ARP announcements have finished or `timeout`
    /// elapsed. Returns `true` when none are left running.
    fn wait_for_announcements(&self, _timeout: Duration) -> bool {
        true
    }
}

pub struct LinuxNetManager {
    layout: Arc<OsLayout>,
    dhcp: DhcpConfigurator,
    manual: StaticInterfaceConfigurator,
}

impl LinuxNetManager {
    pub fn new(
        layout: OsLayout,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CmdRunner>,
        arp_interval: Duration,
    ) -> Self {
        let resolver: Arc<dyn DeviceResolver> = Arc::new(SysfsDeviceResolver::new(
            Arc::clone(&fs),
            layout.device_glob,
            layout.device_address_attr,
        ));
        Self::with_resolver(layout, fs, runner, resolver, arp_interval)
    }

    /// Build with a caller-supplied device resolver.
    pub fn with_resolver(
        layout: OsLayout,
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CmdRunner>,
        resolver: Arc<dyn DeviceResolver>,
        arp_interval: Duration,
    ) -> Self {
        let layout = Arc::new(layout);
        let arp = ArpAnnouncer::new(
            Arc::clone(&runner),
            layout.arp_announce.clone(),
            arp_interval,
        );
        let dhcp = DhcpConfigurator::new(Arc::clone(&fs), Arc::clone(&runner), Arc::clone(&layout));
        let manual =
            StaticInterfaceConfigurator::new(fs, runner, resolver, Arc::clone(&layout), arp);
        Self {
            layout,
            dhcp,
            manual,
        }
    }

    pub fn ubuntu(fs: Arc<dyn FileSystem>, runner: Arc<dyn CmdRunner>, arp_interval: Duration) -> Self {
        Self::new(OsLayout::ubuntu(), fs, runner, arp_interval)
    }

    pub fn centos(fs: Arc<dyn FileSystem>, runner: Arc<dyn CmdRunner>, arp_interval: Duration) -> Self {
        Self::new(OsLayout::centos(), fs, runner, arp_interval)
    }

    pub fn layout(&self) -> &OsLayout {
        &self.layout
    }
}

impl NetManager for LinuxNetManager {
    fn setup_dhcp(&self, networks: &Networks) -> Result<()> {
        log::debug!("Configuring DHCP for {} ({} network(s))", self.layout.family, networks.len());
        self.dhcp.render_and_apply(networks)
    }

    fn setup_manual_networking(&self, networks: &Networks) -> Result<()> {
        let statics = static_networks(networks);
        if statics.is_empty() {
            log::info!("No networks require static assignment");
            return Ok(());
        }
        log::debug!(
            "Configuring {} static network(s) for {}",
            statics.len(),
            self.layout.family
        );
        // The full map is passed on: DNS defaults may come from a network
        // that is not itself static.
        self.manual.render_and_apply(networks)
    }

    fn arp_burst_duration(&self) -> Duration {
        self.manual.arp_burst_duration()
    }

    fn wait_for_announcements(&self, timeout: Duration) -> bool {
        self.manual.wait_for_announcements(timeout)
    }
}
