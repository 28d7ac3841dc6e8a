//! Static interface configuration.
//!
//! Every network with an IP address is bound to a concrete interface through
//! its MAC, rendered in the OS's native format and written together with the
//! resolver file. Interfaces are then bounced and a gratuitous ARP burst is
//! started for each new address.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::net::address::{compute_network_and_broadcast, parse_ipv4};
use crate::net::arp::{ArpAnnouncer, ArpTarget};
use crate::net::device::DeviceResolver;
use crate::net::layout::{InterfaceConfigFormat, InterfaceRestart, OsLayout};
use crate::settings::{DefaultRole, Networks, default_dns_servers};
use crate::system::{CmdRunner, FileSystem};

/// A static network bound to an interface with its derived addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticInterface {
    pub name: String,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub network: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    /// Only set on the gateway-default network.
    pub gateway: Option<String>,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a Debian `interfaces(5)` file. Stanzas are separated by a blank
/// line and the file has no trailing newline.
pub fn render_debian_interfaces(interfaces: &[StaticInterface]) -> String {
    let mut stanzas = vec!["auto lo\niface lo inet loopback".to_string()];
    for iface in interfaces {
        let mut stanza = format!(
            "auto {name}\niface {name} inet static\n    address {}\n    network {}\n    netmask {}\n    broadcast {}",
            iface.address,
            iface.network,
            iface.netmask,
            iface.broadcast,
            name = iface.name,
        );
        if let Some(gateway) = &iface.gateway {
            stanza.push_str(&format!("\n    gateway {gateway}"));
        }
        stanzas.push(stanza);
    }
    stanzas.join("\n\n")
}

pub fn render_ifcfg(iface: &StaticInterface) -> String {
    let mut lines = vec![
        format!("DEVICE={}", iface.name),
        "BOOTPROTO=static".to_string(),
        format!("IPADDR={}", iface.address),
        format!("NETMASK={}", iface.netmask),
        format!("BROADCAST={}", iface.broadcast),
    ];
    if let Some(gateway) = &iface.gateway {
        lines.push(format!("GATEWAY={gateway}"));
    }
    lines.push("ONBOOT=yes".to_string());

    let mut content = lines.join("\n");
    content.push('\n');
    content
}

/// Render `resolv.conf`. Servers are listed in reverse priority order, the
/// same order the DHCP client config prepends them in.
pub fn render_resolv_conf(dns_servers: &[String]) -> String {
    dns_servers
        .iter()
        .rev()
        .map(|server| format!("nameserver {server}\n"))
        .collect()
}

// ---------------------------------------------------------------------------
// StaticInterfaceConfigurator
// ---------------------------------------------------------------------------

pub struct StaticInterfaceConfigurator {
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CmdRunner>,
    resolver: Arc<dyn DeviceResolver>,
    layout: Arc<OsLayout>,
    arp: ArpAnnouncer,
}

impl StaticInterfaceConfigurator {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        runner: Arc<dyn CmdRunner>,
        resolver: Arc<dyn DeviceResolver>,
        layout: Arc<OsLayout>,
        arp: ArpAnnouncer,
    ) -> Self {
        Self {
            fs,
            runner,
            resolver,
            layout,
            arp,
        }
    }

    /// Bind every static network to its interface. Fails before anything is
    /// written if an address is malformed or a MAC has no device.
    pub fn resolve_interfaces(&self, networks: &Networks) -> Result<Vec<StaticInterface>> {
        let mut interfaces = Vec::new();
        for (net_name, network) in networks {
            if !network.requires_static_assignment() {
                continue;
            }
            let (net_addr, broadcast) =
                compute_network_and_broadcast(&network.ip, &network.netmask)?;
            let name = self.resolver.resolve_by_mac(&network.mac)?;
            log::debug!("Network '{net_name}' bound to {name}");

            let gateway = (network.is_default_for(DefaultRole::Gateway)
                && !network.gateway.trim().is_empty())
            .then(|| network.gateway.trim().to_string());

            interfaces.push(StaticInterface {
                name,
                address: parse_ipv4(&network.ip)?,
                netmask: parse_ipv4(&network.netmask)?,
                network: net_addr,
                broadcast,
                gateway,
            });
        }
        Ok(interfaces)
    }

    fn interface_files(&self, interfaces: &[StaticInterface]) -> Vec<(PathBuf, String)> {
        match &self.layout.interface_config {
            InterfaceConfigFormat::DebianInterfaces { path } => {
                vec![(path.clone(), render_debian_interfaces(interfaces))]
            }
            InterfaceConfigFormat::RedhatIfcfg { dir } => interfaces
                .iter()
                .map(|iface| (dir.join(format!("ifcfg-{}", iface.name)), render_ifcfg(iface)))
                .collect(),
        }
    }

    fn restart_interfaces(&self, interfaces: &[StaticInterface]) -> Result<()> {
        match &self.layout.interface_restart {
            InterfaceRestart::PerInterface { stop, start } => {
                for iface in interfaces {
                    log::info!("Restarting interface {}", iface.name);
                    self.runner.run_command(&stop.render(&iface.name, ""))?;
                    self.runner.run_command(&start.render(&iface.name, ""))?;
                }
            }
            InterfaceRestart::Service(command) => {
                log::info!("Restarting network service");
                self.runner.run_command(&command.args())?;
            }
        }
        Ok(())
    }

    /// See [`ArpAnnouncer::wait_idle`].
    pub fn wait_for_announcements(&self, timeout: Duration) -> bool {
        self.arp.wait_idle(timeout)
    }

    /// See [`ArpAnnouncer::burst_duration`].
    pub fn arp_burst_duration(&self) -> Duration {
        self.arp.burst_duration()
    }

    pub fn render_and_apply(&self, networks: &Networks) -> Result<()> {
        let interfaces = self.resolve_interfaces(networks)?;

        for (path, content) in self.interface_files(&interfaces) {
            log::info!("Writing {}", path.display());
            self.fs.write_file(&path, &content)?;
        }

        let dns_servers = default_dns_servers(networks);
        log::info!(
            "Writing {} ({} nameserver(s))",
            self.layout.resolv_conf_path.display(),
            dns_servers.len()
        );
        self.fs.write_file(
            &self.layout.resolv_conf_path,
            &render_resolv_conf(&dns_servers),
        )?;

        self.restart_interfaces(&interfaces)?;

        let targets = interfaces
            .iter()
            .map(|iface| ArpTarget {
                interface: iface.name.clone(),
                address: iface.address.to_string(),
            })
            .collect();
        self.arp.announce(targets);
        Ok(())
    }
}
