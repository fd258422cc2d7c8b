//! The background agent run by the plugin and its stop signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

/// Work loop driven on the plugin's agent thread.
///
/// `run` must return soon after `stop` reports a stop request; `fini`
/// blocks until it does.
pub trait SchedAgent: Send + Sync + 'static {
    fn run(&self, stop: StopToken);

    /// Re-read configuration. Called from the controller's thread while the
    /// agent may be running.
    fn reconfig(&self);
}

/// Stop signal handed to a running agent.
///
/// Nothing is ever sent on the channel; the plugin drops its sender on
/// shutdown and the disconnect is the signal.
#[derive(Clone, Debug)]
pub struct StopToken {
    rx: Receiver<()>,
}

impl StopToken {
    pub(crate) fn new(rx: Receiver<()>) -> Self {
        Self { rx }
    }

    /// Sleep for up to `timeout`, waking early on a stop request.
    /// Returns `true` if stop was requested.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => false,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    pub fn is_stopped(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }
}

/// Agent that does no scheduling work of its own: it wakes every `interval`
/// and counts how often it ran and was reconfigured.
#[derive(Debug)]
pub struct IdleAgent {
    interval: Duration,
    passes: AtomicU64,
    reconfigs: AtomicU64,
}

impl IdleAgent {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            passes: AtomicU64::new(0),
            reconfigs: AtomicU64::new(0),
        }
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    pub fn reconfigs(&self) -> u64 {
        self.reconfigs.load(Ordering::Relaxed)
    }
}

impl Default for IdleAgent {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl SchedAgent for IdleAgent {
    fn run(&self, stop: StopToken) {
        log::debug!("idle agent started, interval {:?}", self.interval);
        while !stop.wait(self.interval) {
            let pass = self.passes.fetch_add(1, Ordering::Relaxed) + 1;
            log::trace!("idle agent pass {pass}");
        }
        log::debug!("idle agent stopping after {} passes", self.passes());
    }

    fn reconfig(&self) {
        self.reconfigs.fetch_add(1, Ordering::Relaxed);
        log::debug!("idle agent reconfigured");
    }
}
