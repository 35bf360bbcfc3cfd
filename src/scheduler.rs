//! Refresh scheduling
//!
//! A single periodic timer drives refresh cycles; manual triggers share the
//! same entry path. The `in_flight` flag is the only shared mutable state
//! guarding against duplicate cycles: a timer fire or manual trigger that
//! lands while a cycle is running is absorbed, never queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// The work one refresh cycle performs; failures are handled inside the
/// cycle so the scheduler only sees completion
pub type CycleFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Scheduled,
    Running,
}

/// Observable refresh bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct RefreshSnapshot {
    pub state: SchedulerState,
    pub enabled: bool,
    pub interval: Option<Duration>,
    pub last_refresh: Option<DateTime<Utc>>,
    pub next_refresh: Option<DateTime<Utc>>,
    pub in_flight: bool,
    pub cycles_completed: u64,
}

struct ScheduleState {
    interval: Option<Duration>,
    enabled: bool,
    last_refresh: Option<DateTime<Utc>>,
    next_refresh: Option<DateTime<Utc>>,
}

struct SchedulerInner {
    cycle: CycleFn,
    in_flight: AtomicBool,
    schedule: RwLock<ScheduleState>,
    cycles: watch::Sender<u64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Runs refresh cycles on a timer, coalescing concurrent triggers
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Arc<SchedulerInner>,
}

impl RefreshScheduler {
    #[must_use]
    pub fn new(cycle: CycleFn) -> Self {
        let (cycles, _) = watch::channel(0);
        Self {
            inner: Arc::new(SchedulerInner {
                cycle,
                in_flight: AtomicBool::new(false),
                schedule: RwLock::new(ScheduleState {
                    interval: None,
                    enabled: false,
                    last_refresh: None,
                    next_refresh: None,
                }),
                cycles,
                task: Mutex::new(None),
            }),
        }
    }

    /// Arm the periodic timer; the first cycle starts immediately
    ///
    /// Calling `start` again replaces any previous timer.
    pub async fn start(&self, interval: Duration) {
        self.cancel_timer().await;

        {
            let mut schedule = self.inner.schedule.write().await;
            schedule.interval = Some(interval);
            schedule.enabled = true;
        }

        info!(?interval, "Starting auto-refresh");
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Fire-and-forget: a fire landing mid-cycle is absorbed by
                // the in-flight guard rather than queued
                tokio::spawn(run_guarded(inner.clone()));
            }
        });
        *self.inner.task.lock().await = Some(handle);
    }

    /// Cancel the timer; a cycle already in flight runs to completion
    pub async fn stop(&self) {
        info!("Stopping auto-refresh");
        self.cancel_timer().await;
        let mut schedule = self.inner.schedule.write().await;
        schedule.enabled = false;
        schedule.next_refresh = None;
    }

    /// Trigger a cycle now; returns false when one was already running
    pub async fn manual_refresh(&self) -> bool {
        run_guarded(self.inner.clone()).await
    }

    /// Current bookkeeping
    pub async fn snapshot(&self) -> RefreshSnapshot {
        let schedule = self.inner.schedule.read().await;
        let in_flight = self.inner.in_flight.load(Ordering::SeqCst);
        let timer_armed = self
            .inner
            .task
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());

        let state = if in_flight {
            SchedulerState::Running
        } else if timer_armed {
            SchedulerState::Scheduled
        } else {
            SchedulerState::Idle
        };

        RefreshSnapshot {
            state,
            enabled: schedule.enabled,
            interval: schedule.interval,
            last_refresh: schedule.last_refresh,
            next_refresh: schedule.next_refresh,
            in_flight,
            cycles_completed: *self.inner.cycles.borrow(),
        }
    }

    /// Observe the completed-cycle counter
    #[must_use]
    pub fn subscribe_cycles(&self) -> watch::Receiver<u64> {
        self.inner.cycles.subscribe()
    }

    async fn cancel_timer(&self) {
        if let Some(handle) = self.inner.task.lock().await.take() {
            handle.abort();
        }
    }
}

/// One guarded cycle: enter only when no cycle is in flight
async fn run_guarded(inner: Arc<SchedulerInner>) -> bool {
    if inner
        .in_flight
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        debug!("Refresh already in flight, trigger absorbed");
        return false;
    }

    {
        let mut schedule = inner.schedule.write().await;
        schedule.last_refresh = Some(Utc::now());
    }

    (inner.cycle)().await;

    inner.in_flight.store(false, Ordering::SeqCst);
    {
        let mut schedule = inner.schedule.write().await;
        if schedule.enabled {
            if let Some(interval) = schedule.interval {
                let interval =
                    chrono::Duration::from_std(interval).unwrap_or_else(|_| chrono::Duration::zero());
                schedule.next_refresh = Utc::now().checked_add_signed(interval);
            }
        }
    }
    inner.cycles.send_modify(|count| *count += 1);
    true
}
