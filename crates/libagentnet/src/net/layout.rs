//! Per-OS file locations and command templates.
//!
//! Everything that differs between OS families lives in one [`OsLayout`]
//! value that is handed to each configurator when it is built. Command
//! templates use `{interface}` and `{address}` placeholders.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// OS family
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Ubuntu,
    Centos,
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ubuntu => write!(f, "ubuntu"),
            Self::Centos => write!(f, "centos"),
        }
    }
}

impl FromStr for OsFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ubuntu" | "debian" => Ok(Self::Ubuntu),
            "centos" | "rhel" => Ok(Self::Centos),
            other => Err(format!("unsupported OS family '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Command templates
// ---------------------------------------------------------------------------

/// An argument vector with optional placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate(pub Vec<&'static str>);

impl CommandTemplate {
    /// Render without substitutions.
    pub fn args(&self) -> Vec<String> {
        self.0.iter().map(|a| a.to_string()).collect()
    }

    pub fn render(&self, interface: &str, address: &str) -> Vec<String> {
        self.0
            .iter()
            .map(|a| a.replace("{interface}", interface).replace("{address}", address))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Static interface layout
// ---------------------------------------------------------------------------

/// How static interface configuration is laid out on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceConfigFormat {
    /// A single Debian `interfaces(5)` file holding every stanza.
    DebianInterfaces { path: PathBuf },
    /// One Red Hat `ifcfg-<name>` file per interface in `dir`.
    RedhatIfcfg { dir: PathBuf },
}

/// How interfaces are bounced after their configuration was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceRestart {
    /// Stop then start each interface.
    PerInterface {
        stop: CommandTemplate,
        start: CommandTemplate,
    },
    /// Restart the networking service once for all interfaces.
    Service(CommandTemplate),
}

// ---------------------------------------------------------------------------
// OsLayout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsLayout {
    pub family: OsFamily,
    pub dhcp_config_path: PathBuf,
    /// The `send host-name` statement of the DHCP client config.
    pub dhcp_host_name_directive: &'static str,
    /// Commands run, in order, after the DHCP client config changed.
    pub dhcp_restart: Vec<CommandTemplate>,
    pub interface_config: InterfaceConfigFormat,
    pub interface_restart: InterfaceRestart,
    pub resolv_conf_path: PathBuf,
    /// Glob listing network device entries.
    pub device_glob: &'static str,
    /// Attribute file inside a device entry holding its hardware address.
    pub device_address_attr: &'static str,
    pub arp_announce: CommandTemplate,
}

impl OsLayout {
    pub fn for_family(family: OsFamily) -> Self {
        match family {
            OsFamily::Ubuntu => Self::ubuntu(),
            OsFamily::Centos => Self::centos(),
        }
    }

    pub fn ubuntu() -> Self {
        Self {
            family: OsFamily::Ubuntu,
            dhcp_config_path: PathBuf::from("/etc/dhcp3/dhclient.conf"),
            dhcp_host_name_directive: "send host-name \"<hostname>\";",
            dhcp_restart: vec![
                CommandTemplate(vec!["pkill", "dhclient3"]),
                CommandTemplate(vec!["/etc/init.d/networking", "restart"]),
            ],
            interface_config: InterfaceConfigFormat::DebianInterfaces {
                path: PathBuf::from("/etc/network/interfaces"),
            },
            interface_restart: InterfaceRestart::PerInterface {
                stop: CommandTemplate(vec![
                    "service",
                    "network-interface",
                    "stop",
                    "INTERFACE={interface}",
                ]),
                start: CommandTemplate(vec![
                    "service",
                    "network-interface",
                    "start",
                    "INTERFACE={interface}",
                ]),
            },
            resolv_conf_path: PathBuf::from("/etc/resolv.conf"),
            device_glob: "/sys/class/net/*",
            device_address_attr: "address",
            arp_announce: arping(),
        }
    }

    pub fn centos() -> Self {
        Self {
            family: OsFamily::Centos,
            dhcp_config_path: PathBuf::from("/etc/dhcp/dhclient.conf"),
            dhcp_host_name_directive: "send host-name = gethostname();",
            dhcp_restart: vec![
                CommandTemplate(vec!["pkill", "dhclient"]),
                CommandTemplate(vec!["service", "network", "restart"]),
            ],
            interface_config: InterfaceConfigFormat::RedhatIfcfg {
                dir: PathBuf::from("/etc/sysconfig/network-scripts"),
            },
            interface_restart: InterfaceRestart::Service(CommandTemplate(vec![
                "service", "network", "restart",
            ])),
            resolv_conf_path: PathBuf::from("/etc/resolv.conf"),
            device_glob: "/sys/class/net/*",
            device_address_attr: "address",
            arp_announce: arping(),
        }
    }
}

fn arping() -> CommandTemplate {
    CommandTemplate(vec![
        "arping",
        "-c",
        "1",
        "-U",
        "-I",
        "{interface}",
        "{address}",
    ])
}
