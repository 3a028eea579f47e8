//! Hand-off of interrupted agents to the replan coordinator.
//!
//! Executors push; the coordinator blocks on a condition variable until work
//! arrives, then takes the whole pending batch at once, ordered by remaining
//! route length (shortest first, ties in arrival order).  While a batch is
//! being processed it counts as in flight, so [`AffectedQueue::is_idle`]
//! only reports idle once every interrupted agent has been decided.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use lot_core::{AgentClass, AgentId, Pos};

use crate::LegKind;

/// Everything the coordinator needs to replan one interrupted agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffectedAgentInfo {
    pub agent:           AgentId,
    pub class:           AgentClass,
    pub leg:             LegKind,
    /// Route still to drive, starting at `current`.
    pub remaining:       Vec<Pos>,
    /// `remaining.len()` at hand-off; the batch ordering key.
    pub remaining_len:   usize,
    /// Cell the agent holds.
    pub current:         Pos,
    /// Cell the agent left most recently, if it has moved at all.
    pub previous:        Option<Pos>,
    /// Final cell of the interrupted route.
    pub destination:     Pos,
    pub admission_index: usize,
    /// Counters accumulated before the interruption.
    pub elapsed_ticks:   u64,
    pub delay_ticks:     u64,
}

#[derive(Default)]
struct QueueState {
    pending:   Vec<(u64, AffectedAgentInfo)>,
    next_seq:  u64,
    in_flight: usize,
    closed:    bool,
}

/// Mutex + condvar queue between executors and the coordinator.
#[derive(Default)]
pub struct AffectedQueue {
    state: Mutex<QueueState>,
    ready: Condvar,
}

impl AffectedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand `info` over.  Ignored once the queue is closed.
    pub fn push(&self, info: AffectedAgentInfo) {
        let mut st = self.state.lock();
        if st.closed {
            return;
        }
        let seq = st.next_seq;
        st.next_seq += 1;
        st.pending.push((seq, info));
        self.ready.notify_all();
    }

    /// Block until at least one agent is pending, then take every pending
    /// agent, shortest remaining route first.
    ///
    /// Returns `None` once the queue is closed and drained.  The caller must
    /// call [`finish_one`][Self::finish_one] for every returned agent.
    pub fn take_batch(&self) -> Option<Vec<AffectedAgentInfo>> {
        let mut st = self.state.lock();
        while st.pending.is_empty() {
            if st.closed {
                return None;
            }
            self.ready.wait(&mut st);
        }
        let mut batch = std::mem::take(&mut st.pending);
        batch.sort_by_key(|(seq, info)| (info.remaining_len, *seq));
        st.in_flight += batch.len();
        Some(batch.into_iter().map(|(_, info)| info).collect())
    }

    /// Non-blocking variant of [`take_batch`][Self::take_batch]; returns an
    /// empty batch when nothing is pending.
    pub fn try_take_batch(&self) -> Vec<AffectedAgentInfo> {
        let mut st = self.state.lock();
        let mut batch = std::mem::take(&mut st.pending);
        batch.sort_by_key(|(seq, info)| (info.remaining_len, *seq));
        st.in_flight += batch.len();
        batch.into_iter().map(|(_, info)| info).collect()
    }

    /// Mark one taken agent as decided.
    pub fn finish_one(&self) {
        let mut st = self.state.lock();
        st.in_flight = st.in_flight.saturating_sub(1);
        if st.pending.is_empty() && st.in_flight == 0 {
            self.ready.notify_all();
        }
    }

    /// Nothing pending and nothing being decided.
    pub fn is_idle(&self) -> bool {
        let st = self.state.lock();
        st.pending.is_empty() && st.in_flight == 0
    }

    /// Block until idle or `timeout` elapses.  Returns whether idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut st = self.state.lock();
        while !(st.pending.is_empty() && st.in_flight == 0) {
            if self.ready.wait_until(&mut st, deadline).timed_out() {
                return st.pending.is_empty() && st.in_flight == 0;
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting work and wake every waiter.  Pending agents are
    /// dropped.
    pub fn close(&self) {
        let mut st = self.state.lock();
        st.closed = true;
        st.pending.clear();
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
