//! DHCP client configuration.
//!
//! The rendered `dhclient.conf` is compared with what is on disk and the
//! DHCP client is only bounced when the two differ, so re-applying the same
//! settings never interrupts a working lease.

use std::sync::Arc;

use crate::error::Result;
use crate::net::layout::OsLayout;
use crate::settings::{Networks, default_dns_servers};
use crate::system::{CmdRunner, FileSystem};

const DHCP_CONFIG_HEADER: &str = "# Generated by bosh-agent\n\
\n\
option rfc3442-classless-static-routes code 121 = array of unsigned integer 8;\n";

const DHCP_REQUEST_CLAUSE: &str = "request subnet-mask, broadcast-address, time-offset, routers,\n\
\tdomain-name, domain-name-servers, domain-search, host-name,\n\
\tnetbios-name-servers, netbios-scope, interface-mtu,\n\
\trfc3442-classless-static-routes, ntp-servers;\n";

/// Render the DHCP client configuration.
///
/// `prepend` pushes each server to the front of the lease's list, so the
/// servers are emitted lowest priority first to end up in priority order.
pub fn render_dhcp_config(host_name_directive: &str, dns_servers: &[String]) -> String {
    let mut content = String::new();
    content.push_str(DHCP_CONFIG_HEADER);
    content.push('\n');
    content.push_str(host_name_directive);
    content.push_str("\n\n");
    content.push_str(DHCP_REQUEST_CLAUSE);
    content.push('\n');
    for server in dns_servers.iter().rev() {
        content.push_str(&format!("prepend domain-name-servers {server};\n"));
    }
    content
}

pub struct DhcpConfigurator {
    fs: Arc<dyn FileSystem>,
    runner: Arc<dyn CmdRunner>,
    layout: Arc<OsLayout>,
}

impl DhcpConfigurator {
    pub fn new(fs: Arc<dyn FileSystem>, runner: Arc<dyn CmdRunner>, layout: Arc<OsLayout>) -> Self {
        Self { fs, runner, layout }
    }

    pub fn render_and_apply(&self, networks: &Networks) -> Result<()> {
        let dns_servers = default_dns_servers(networks);
        let desired = render_dhcp_config(self.layout.dhcp_host_name_directive, &dns_servers);
        let path = &self.layout.dhcp_config_path;

        let current = self.fs.read_file(path)?;
        if current.as_deref() == Some(desired.as_str()) {
            log::info!(
                "{} is up to date, not restarting DHCP client",
                path.display()
            );
            return Ok(());
        }

        log::info!(
            "Writing {} ({} DNS server(s))",
            path.display(),
            dns_servers.len()
        );
        self.fs.write_file(path, &desired)?;

        for command in &self.layout.dhcp_restart {
            self.runner.run_command(&command.args())?;
        }
        Ok(())
    }
}
