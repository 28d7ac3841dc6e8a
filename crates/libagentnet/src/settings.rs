//! Network settings as delivered by the control plane.
//!
//! A settings document carries a map of named networks. Each network may be
//! marked as the default provider of DNS servers and/or the default gateway;
//! networks with an `ip` are configured statically, the rest are left to DHCP.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Named networks, iterated in name order so rendered files are stable.
pub type Networks = BTreeMap<String, Network>;

/// Cross-cutting settings a network may contribute when several are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultRole {
    Dns,
    Gateway,
}

/// A single network definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Network {
    /// Roles this network is the default for.
    pub default: Vec<DefaultRole>,
    pub ip: String,
    pub netmask: String,
    pub gateway: String,
    /// Hardware address of the interface this network binds to.
    pub mac: String,
    /// Resolvers, highest priority first.
    pub dns: Vec<String>,
}

impl Network {
    pub fn is_default_for(&self, role: DefaultRole) -> bool {
        self.default.contains(&role)
    }

    /// Networks with an IP address are configured statically.
    pub fn requires_static_assignment(&self) -> bool {
        !self.ip.trim().is_empty()
    }
}

/// DNS servers contributed by the `dns`-default networks, in priority order
/// with duplicates removed (first occurrence wins).
pub fn default_dns_servers(networks: &Networks) -> Vec<String> {
    let mut servers: Vec<String> = Vec::new();
    for network in networks.values() {
        if !network.is_default_for(DefaultRole::Dns) {
            continue;
        }
        for server in &network.dns {
            if !servers.contains(server) {
                servers.push(server.clone());
            }
        }
    }
    servers
}

/// The subset of `networks` that needs static address assignment.
pub fn static_networks(networks: &Networks) -> Networks {
    networks
        .iter()
        .filter(|(_, network)| network.requires_static_assignment())
        .map(|(name, network)| (name.clone(), network.clone()))
        .collect()
}

/// The agent settings document. Only the networking part is modelled; other
/// top-level keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub networks: Networks,
}

impl Settings {
    pub fn from_json(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read and parse a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::file_io(path, e))?;
        let settings = Self::from_json(&content, path)?;
        log::debug!(
            "Loaded {} network(s) from {}",
            settings.networks.len(),
            path.display()
        );
        Ok(settings)
    }
}
