//! Gratuitous ARP announcements.
//!
//! After an interface comes up with a static address, neighbours may still
//! cache a stale MAC for it. A short burst of unsolicited ARP replies fixes
//! that. The burst runs on a detached thread so the caller returns as soon
//! as the configuration is applied.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use crate::net::layout::CommandTemplate;
use crate::system::CmdRunner;
use crate::system::lock_ext::MutexExt;

pub const DEFAULT_ARP_ROUNDS: usize = 6;
pub const DEFAULT_ARP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpTarget {
    pub interface: String,
    pub address: String,
}

// ---------------------------------------------------------------------------
// In-flight burst tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct InFlight {
    bursts: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn finish(&self) {
        let mut bursts = self.bursts.lock_poisoned();
        *bursts = bursts.saturating_sub(1);
        if *bursts == 0 {
            self.idle.notify_all();
        }
    }
}

/// Decrements the in-flight count when the burst thread ends, including by
/// panic, or when the closure is dropped because the spawn failed.
struct BurstGuard(Arc<InFlight>);

impl Drop for BurstGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

// ---------------------------------------------------------------------------
// ArpAnnouncer
// ---------------------------------------------------------------------------

pub struct ArpAnnouncer {
    runner: Arc<dyn CmdRunner>,
    template: CommandTemplate,
    rounds: usize,
    interval: Duration,
    in_flight: Arc<InFlight>,
}

impl ArpAnnouncer {
    pub fn new(runner: Arc<dyn CmdRunner>, template: CommandTemplate, interval: Duration) -> Self {
        Self {
            runner,
            template,
            rounds: DEFAULT_ARP_ROUNDS,
            interval,
            in_flight: Arc::default(),
        }
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }

    /// Nominal length of a burst, `rounds * interval`. Slow announcement
    /// commands stretch a real burst past it; see [`Self::wait_idle`].
    pub fn burst_duration(&self) -> Duration {
        self.interval * self.rounds as u32
    }

    /// Block until every burst started by this announcer has finished, or
    /// `timeout` elapsed. Returns `true` when nothing is left running.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let bursts = self.in_flight.bursts.lock_poisoned();
        let (bursts, _) = self
            .in_flight
            .idle
            .wait_timeout_while(bursts, timeout, |n| *n > 0)
            .unwrap_or_else(|e| e.into_inner());
        *bursts == 0
    }

    /// Start a burst for `targets` and return immediately.
    ///
    /// Each round announces every target once; rounds are separated by the
    /// configured interval. Failed announcements are logged and do not stop
    /// the burst.
    pub fn announce(&self, targets: Vec<ArpTarget>) {
        if targets.is_empty() || self.rounds == 0 {
            return;
        }

        let runner = Arc::clone(&self.runner);
        let template = self.template.clone();
        let rounds = self.rounds;
        let interval = self.interval;

        *self.in_flight.bursts.lock_poisoned() += 1;
        let guard = BurstGuard(Arc::clone(&self.in_flight));

        let spawned = thread::Builder::new()
            .name("arp-announce".into())
            .spawn(move || {
                let _guard = guard;
                for round in 0..rounds {
                    if round > 0 {
                        thread::sleep(interval);
                    }
                    for target in &targets {
                        let args = template.render(&target.interface, &target.address);
                        if let Err(e) = runner.run_command(&args) {
                            log::warn!(
                                "ARP announcement {}/{} for {} on {} failed: {}",
                                round + 1,
                                rounds,
                                target.address,
                                target.interface,
                                e
                            );
                        }
                    }
                }
                log::debug!("ARP burst finished after {rounds} round(s)");
            });

        if let Err(e) = spawned {
            log::error!("Failed to spawn ARP announcement thread: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::layout::OsLayout;
    use crate::system::fakes::FakeCmdRunner;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn wait_for_commands(runner: &FakeCmdRunner, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while runner.command_count() < count && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn target(interface: &str, address: &str) -> ArpTarget {
        ArpTarget {
            interface: interface.into(),
            address: address.into(),
        }
    }

    #[test]
    fn test_announce_runs_six_rounds() {
        let runner = Arc::new(FakeCmdRunner::new());
        let arp = ArpAnnouncer::new(
            runner.clone(),
            OsLayout::ubuntu().arp_announce,
            Duration::from_millis(1),
        );

        arp.announce(vec![target("eth0", "192.168.195.6")]);
        wait_for_commands(&runner, 6);

        let expected: Vec<String> = ["arping", "-c", "1", "-U", "-I", "eth0", "192.168.195.6"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let commands = runner.run_commands();
        assert_eq!(commands.len(), 6);
        assert!(commands.iter().all(|c| *c == expected));
    }

    #[test]
    fn test_announce_round_robins_targets() {
        let runner = Arc::new(FakeCmdRunner::new());
        let arp = ArpAnnouncer::new(
            runner.clone(),
            OsLayout::ubuntu().arp_announce,
            Duration::from_millis(1),
        )
        .with_rounds(2);

        arp.announce(vec![target("eth0", "10.0.0.2"), target("eth1", "10.1.0.2")]);
        wait_for_commands(&runner, 4);

        let interfaces: Vec<String> = runner
            .run_commands()
            .iter()
            .map(|c| c[5].clone())
            .collect();
        assert_eq!(interfaces, vec!["eth0", "eth1", "eth0", "eth1"]);
    }

    #[test]
    fn test_announce_returns_before_burst_completes() {
        let runner = Arc::new(FakeCmdRunner::new());
        let arp = ArpAnnouncer::new(
            runner.clone(),
            OsLayout::ubuntu().arp_announce,
            Duration::from_millis(50),
        );

        arp.announce(vec![target("eth0", "192.168.195.6")]);

        assert!(runner.command_count() < 6);
        wait_for_commands(&runner, 6);
        assert_eq!(runner.command_count(), 6);
    }

    #[test]
    fn test_announce_continues_after_failure() {
        let runner = Arc::new(FakeCmdRunner::new());
        runner.fail_command(
            &["arping", "-c", "1", "-U", "-I", "eth0", "192.168.195.6"],
            "exit status: 2",
        );
        let arp = ArpAnnouncer::new(
            runner.clone(),
            OsLayout::ubuntu().arp_announce,
            Duration::from_millis(1),
        );

        arp.announce(vec![target("eth0", "192.168.195.6")]);
        wait_for_commands(&runner, 6);

        assert_eq!(runner.command_count(), 6);
    }

    #[test]
    fn test_announce_without_targets_is_a_no_op() {
        let runner = Arc::new(FakeCmdRunner::new());
        let arp = ArpAnnouncer::new(
            runner.clone(),
            OsLayout::ubuntu().arp_announce,
            Duration::from_millis(1),
        );

        arp.announce(Vec::new());
        thread::sleep(Duration::from_millis(20));

        assert_eq!(runner.command_count(), 0);
    }

    /// Each command takes `delay` to complete, like a real `arping`.
    struct SlowCmdRunner {
        delay: Duration,
        completed: AtomicUsize,
    }

    impl CmdRunner for SlowCmdRunner {
        fn run_command(&self, _args: &[String]) -> crate::error::Result<String> {
            thread::sleep(self.delay);
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        }
    }

    #[test]
    fn test_wait_idle_covers_slow_commands() {
        let runner = Arc::new(SlowCmdRunner {
            delay: Duration::from_millis(30),
            completed: AtomicUsize::new(0),
        });
        let arp = ArpAnnouncer::new(
            runner.clone(),
            OsLayout::ubuntu().arp_announce,
            Duration::from_millis(10),
        );

        arp.announce(vec![target("eth0", "192.168.195.6")]);

        assert!(arp.wait_idle(Duration::from_secs(5)));
        assert_eq!(runner.completed.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_wait_idle_times_out_while_running() {
        let runner = Arc::new(SlowCmdRunner {
            delay: Duration::from_millis(50),
            completed: AtomicUsize::new(0),
        });
        let arp = ArpAnnouncer::new(
            runner.clone(),
            OsLayout::ubuntu().arp_announce,
            Duration::from_millis(10),
        );

        arp.announce(vec![target("eth0", "192.168.195.6")]);

        assert!(!arp.wait_idle(Duration::from_millis(5)));
        assert!(arp.wait_idle(Duration::from_secs(5)));
    }

    #[test]
    fn test_wait_idle_without_bursts() {
        let runner = Arc::new(FakeCmdRunner::new());
        let arp = ArpAnnouncer::new(runner, OsLayout::ubuntu().arp_announce, Duration::from_secs(1));
        arp.announce(Vec::new());
        assert!(arp.wait_idle(Duration::ZERO));
    }

    #[test]
    fn test_burst_duration() {
        let runner = Arc::new(FakeCmdRunner::new());
        let arp = ArpAnnouncer::new(runner, OsLayout::ubuntu().arp_announce, Duration::from_millis(10));
        assert_eq!(arp.burst_duration(), Duration::from_millis(60));
        assert_eq!(arp.with_rounds(0).burst_duration(), Duration::ZERO);
    }
}
