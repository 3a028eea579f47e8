//! Worker-thread bookkeeping for motion executors.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

use crate::{Leg, MotionExecutor, MotionResult, SimulationContext};

/// Spawns one named thread per leg and tracks how many are still running.
#[derive(Default)]
pub struct Supervisor {
    handles: Mutex<Vec<JoinHandle<()>>>,
    active:  Mutex<usize>,
    idle:    Condvar,
}

/// Decrements the active count when a worker exits, panics included.
struct ActiveGuard(Arc<Supervisor>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let mut active = self.0.active.lock();
        *active = active.saturating_sub(1);
        self.0.idle.notify_all();
    }
}

impl Supervisor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Run `leg` on a new thread named `agent-<id>`.
    pub fn spawn_leg(self: &Arc<Self>, ctx: &Arc<SimulationContext>, leg: Leg) -> MotionResult<()> {
        *self.active.lock() += 1;
        let guard = ActiveGuard(Arc::clone(self));
        let ctx = Arc::clone(ctx);
        let agent = leg.agent;

        let spawned = thread::Builder::new()
            .name(format!("agent-{}", agent.0))
            .spawn(move || {
                let _guard = guard;
                let outcome = MotionExecutor::new(ctx, leg).run();
                debug!(%agent, ?outcome, "worker exit");
            });

        // On failure the closure (and the guard inside it) was dropped, so
        // the active count is already restored.
        let handle = spawned.inspect_err(|e| error!(%agent, "spawn failed: {e}"))?;

        let mut handles = self.handles.lock();
        let (done, live): (Vec<_>, Vec<_>) =
            std::mem::take(&mut *handles).into_iter().partition(|h| h.is_finished());
        *handles = live;
        handles.push(handle);
        drop(handles);
        for h in done {
            reap(h);
        }
        Ok(())
    }

    /// Number of legs still running.
    pub fn active(&self) -> usize {
        *self.active.lock()
    }

    /// Wait until no leg is running and `settled()` holds, or `timeout`
    /// elapses.  `settled` is re-checked whenever a worker exits and at
    /// least every `poll`.
    pub fn wait_until(
        &self,
        timeout: Duration,
        poll: Duration,
        settled: impl Fn() -> bool,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        let mut active = self.active.lock();
        loop {
            if *active == 0 && settled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let step = poll.min(deadline - now);
            self.idle.wait_for(&mut active, step);
        }
    }

    /// Join every worker thread spawned so far.
    pub fn join_all(&self) {
        let handles = std::mem::take(&mut *self.handles.lock());
        for h in handles {
            reap(h);
        }
    }
}

/// Join a finished or finishing worker.  Returns `false` if it panicked.
pub(crate) fn reap(handle: JoinHandle<()>) -> bool {
    let name = handle.thread().name().unwrap_or("agent").to_owned();
    let joined = handle.join().is_ok();
    if !joined {
        error!(worker = %name, "agent worker panicked");
    }
    joined
}
