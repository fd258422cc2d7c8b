//! Scheduler plugin boundary.
//!
//! A controller loads one scheduler plugin and drives it through four
//! hooks: `init` starts the plugin's background agent thread, `fini` stops
//! and joins it, `reconfig` forwards a configuration reload to the agent,
//! and `initial_priority` assigns the starting priority of each new job.
//! [`SchedPlugin`] implements those hooks over any [`SchedAgent`] and
//! [`PriorityPolicy`].

pub mod agent;
pub mod error;
pub mod priority;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

pub use agent::{IdleAgent, SchedAgent, StopToken};
pub use error::SchedError;
pub use priority::{BasicPriority, JobRecord, PriorityPolicy};

pub const PLUGIN_NAME: &str = "idle scheduler plugin";
pub const PLUGIN_TYPE: &str = "sched/idle";
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A running agent thread and the sender whose drop stops it.
struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct SchedPlugin<A, P = BasicPriority> {
    agent: Arc<A>,
    policy: P,
    worker: Mutex<Option<Worker>>,
}

impl<A: SchedAgent, P: PriorityPolicy> SchedPlugin<A, P> {
    pub fn new(agent: A, policy: P) -> Self {
        Self {
            agent: Arc::new(agent),
            policy,
            worker: Mutex::new(None),
        }
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn is_running(&self) -> bool {
        self.lock_worker().is_some()
    }

    /// Start the agent thread. At most one runs at a time; a second call
    /// while it is up leaves it alone and returns
    /// [`SchedError::AlreadyRunning`].
    pub fn init(&self) -> Result<(), SchedError> {
        log::info!("sched: {PLUGIN_NAME} loaded");

        let mut worker = self.lock_worker();
        if worker.is_some() {
            log::debug!("scheduler agent thread already running, not starting another");
            return Err(SchedError::AlreadyRunning);
        }

        // Zero capacity: nothing is ever sent, the agent only sees the disconnect.
        let (stop, rx) = crossbeam_channel::bounded(0);
        let token = StopToken::new(rx);
        let agent = Arc::clone(&self.agent);
        let handle = thread::Builder::new()
            .name("sched-agent".into())
            .spawn(move || agent.run(token))
            .map_err(SchedError::Spawn)?;

        *worker = Some(Worker { stop, handle });
        Ok(())
    }

    /// Stop the agent thread and wait for it to exit. Does nothing if it is
    /// not running.
    pub fn fini(&self) {
        let mut worker = self.lock_worker();
        let Some(Worker { stop, handle }) = worker.take() else {
            return;
        };

        log::info!("{PLUGIN_NAME} shutting down");
        drop(stop);
        if handle.join().is_err() {
            log::error!("scheduler agent thread panicked");
        }
    }

    pub fn reconfig(&self) -> Result<(), SchedError> {
        self.agent.reconfig();
        Ok(())
    }

    pub fn initial_priority(&self, last_prio: u32, job: &JobRecord) -> u32 {
        self.policy.set_priority(last_prio, job)
    }

    // A panic while holding the lock leaves the Option consistent.
    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A, P> Drop for SchedPlugin<A, P> {
    fn drop(&mut self) {
        let worker = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(Worker { stop, handle }) = worker {
            drop(stop);
            let _ = handle.join();
        }
    }
}
