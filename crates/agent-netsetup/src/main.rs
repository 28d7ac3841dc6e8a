//! agent-netsetup: apply agent network settings to a Linux host.
//!
//! Reads a settings document and either configures the DHCP client or
//! writes static interface configuration, using the file layout and
//! service commands of the selected OS family.
//!
//! Usage:
//!   agent-netsetup setup-dhcp --settings /var/vcap/bosh/settings.json
//!   agent-netsetup --os centos setup-manual --settings settings.json
//!   agent-netsetup --root /mnt/image --dry-run setup-manual --settings s.json

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use libagentnet::net::{DEFAULT_ARP_INTERVAL, OsFamily};
use libagentnet::system::{CmdRunner, DryRunCmdRunner, ExecCmdRunner, FileSystem, OsFileSystem};
use libagentnet::{LinuxPlatform, Platform, Settings};

const LOG_LEVEL_ENV: &str = "AGENT_LOG_LEVEL";

/// Extra time granted to the ARP burst beyond its sleeps, for the
/// announcement commands themselves.
const ARP_COMPLETION_SLACK: Duration = Duration::from_secs(30);

/// Apply agent network settings to a Linux host
#[derive(Parser, Debug)]
#[command(name = "agent-netsetup", version, about)]
struct Cli {
    /// OS family whose file layout and service commands are used
    #[arg(long, default_value = "ubuntu")]
    os: OsFamily,

    /// Treat DIR as the root of the file system for every file written
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Delay between gratuitous ARP rounds, in milliseconds
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ARP_INTERVAL.as_millis() as u64)]
    arp_interval_ms: u64,

    /// Log commands instead of executing them
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Configure the DHCP client, restarting it only if its config changed
    SetupDhcp {
        /// Path to the settings JSON document
        #[arg(long)]
        settings: PathBuf,
    },
    /// Write static interface configuration and restart the interfaces
    SetupManual {
        /// Path to the settings JSON document
        #[arg(long)]
        settings: PathBuf,
    },
}

/// Accepts level names and syslog priorities 0-7.
fn parse_log_level(value: &str) -> Option<log::LevelFilter> {
    let level = match value.trim().to_ascii_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" | "7" => log::LevelFilter::Debug,
        "info" | "6" => log::LevelFilter::Info,
        "notice" | "5" | "warn" | "warning" | "4" => log::LevelFilter::Warn,
        "error" | "err" | "3" | "crit" | "2" | "alert" | "1" | "emerg" | "0" => {
            log::LevelFilter::Error
        }
        "off" => log::LevelFilter::Off,
        _ => return None,
    };
    Some(level)
}

fn setup_logging() {
    let level = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| parse_log_level(&value))
        .unwrap_or(log::LevelFilter::Info);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][agent-netsetup][{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .ok();
}

fn build_platform(cli: &Cli) -> LinuxPlatform {
    let fs: Arc<dyn FileSystem> = match &cli.root {
        Some(root) => Arc::new(OsFileSystem::with_root(root)),
        None => Arc::new(OsFileSystem::new()),
    };
    let runner: Arc<dyn CmdRunner> = if cli.dry_run {
        Arc::new(DryRunCmdRunner)
    } else {
        Arc::new(ExecCmdRunner)
    };
    LinuxPlatform::for_os(
        cli.os,
        fs,
        runner,
        Duration::from_millis(cli.arp_interval_ms),
    )
}

fn run(cli: &Cli) -> libagentnet::Result<()> {
    let platform = build_platform(cli);
    match &cli.command {
        Command::SetupDhcp { settings } => {
            let settings = Settings::load(settings)?;
            platform.setup_dhcp(&settings.networks)
        }
        Command::SetupManual { settings } => {
            let settings = Settings::load(settings)?;
            platform.setup_manual_networking(&settings.networks)?;
            // The ARP burst runs on a detached thread and dies with the
            // process.
            let timeout = platform.arp_burst_duration() + ARP_COMPLETION_SLACK;
            log::debug!("Waiting up to {}ms for ARP announcements", timeout.as_millis());
            if !platform.wait_for_announcements(timeout) {
                log::warn!(
                    "ARP announcements still running after {}s, exiting anyway",
                    timeout.as_secs()
                );
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging();

    log::debug!("Using {} layout", cli.os);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
