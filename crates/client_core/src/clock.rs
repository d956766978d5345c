//! Time source and cancellable delayed callbacks used by the undo window.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use chrono::Utc;
use tokio::{sync::mpsc, task::JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Schedules one-shot timers. Firings are delivered out of band (see [`TokioScheduler`]).
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration) -> TimerId;
    fn cancel(&self, timer: TimerId);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

#[derive(Default)]
struct TimelineState {
    now: u64,
    next_id: u64,
    pending: BTreeMap<TimerId, u64>,
}

/// Logical clock and scheduler. Time only moves through [`ManualTimeline::advance`].
#[derive(Default)]
pub struct ManualTimeline {
    state: Mutex<TimelineState>,
}

impl ManualTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, TimelineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Moves time forward and returns the timers that came due, earliest first.
    pub fn advance(&self, by: Duration) -> Vec<TimerId> {
        let mut state = self.state();
        state.now += by.as_millis() as u64;
        let now = state.now;

        let mut due: Vec<(u64, TimerId)> = state
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (*deadline, *id))
            .collect();
        due.sort();
        for (_, id) in &due {
            state.pending.remove(id);
        }
        due.into_iter().map(|(_, id)| id).collect()
    }

    pub fn pending(&self) -> usize {
        self.state().pending.len()
    }
}

impl Clock for ManualTimeline {
    fn now_millis(&self) -> u64 {
        self.state().now
    }
}

impl Scheduler for ManualTimeline {
    fn schedule(&self, delay: Duration) -> TimerId {
        let mut state = self.state();
        state.next_id += 1;
        let id = TimerId(state.next_id);
        let deadline = state.now + delay.as_millis() as u64;
        state.pending.insert(id, deadline);
        id
    }

    fn cancel(&self, timer: TimerId) {
        self.state().pending.remove(&timer);
    }
}

/// Each timer is a sleeping tokio task; firings arrive on the returned receiver.
///
/// `schedule` must be called from within a tokio runtime.
pub struct TokioScheduler {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<TimerId, JoinHandle<()>>>,
    fired: mpsc::UnboundedSender<TimerId>,
}

impl TokioScheduler {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<TimerId>) {
        let (fired, rx) = mpsc::unbounded_channel();
        let scheduler = Arc::new(Self {
            next_id: AtomicU64::new(0),
            tasks: Mutex::new(HashMap::new()),
            fired,
        });
        (scheduler, rx)
    }

    fn tasks(&self) -> std::sync::MutexGuard<'_, HashMap<TimerId, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let fired = self.fired.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = fired.send(id);
        });

        let mut tasks = self.tasks();
        tasks.retain(|_, task| !task.is_finished());
        tasks.insert(id, handle);
        id
    }

    fn cancel(&self, timer: TimerId) {
        if let Some(task) = self.tasks().remove(&timer) {
            task.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks().drain() {
            task.abort();
        }
    }
}
