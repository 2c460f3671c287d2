// Automatic sync policy: a minimum interval between cycles and a single
// in-flight cycle. A trigger that lands mid-cycle is dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use skillsync_common::types::SyncResult;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::git::worker::{CommandExecutor, ProcessCommandExecutor};
use crate::git::SyncEngine;
use crate::notify::{NotificationSink, TracingNotifier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Ran(SyncResult),
    CoolingDown { remaining: Duration },
    InFlight,
}

#[derive(Debug, Default)]
struct SchedulerState {
    last_started: Option<Instant>,
    last_result: Option<SyncResult>,
    last_sync_at: Option<DateTime<Utc>>,
}

pub struct SyncScheduler<E = ProcessCommandExecutor> {
    engine: Arc<SyncEngine<E>>,
    notifier: Arc<dyn NotificationSink>,
    min_interval: Duration,
    in_flight: AtomicBool,
    state: Mutex<SchedulerState>,
}

/// Clears the in-flight flag when a cycle ends, including by panic.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<E: CommandExecutor + 'static> SyncScheduler<E> {
    pub fn new(engine: Arc<SyncEngine<E>>, config: &SchedulerConfig) -> Self {
        Self {
            engine,
            notifier: Arc::new(TracingNotifier),
            min_interval: config.min_interval(),
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SchedulerState::default()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn engine(&self) -> &Arc<SyncEngine<E>> {
        &self.engine
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one sync cycle unless one is already running or, without
    /// `force`, the previous one started less than the minimum interval ago.
    pub async fn trigger(&self, force: bool) -> TriggerOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("sync already in flight, dropping trigger");
            return TriggerOutcome::InFlight;
        }
        let _guard = InFlightGuard(&self.in_flight);

        {
            let mut state = self.state.lock().await;
            if let (false, Some(last)) = (force, state.last_started) {
                let elapsed = last.elapsed();
                if elapsed < self.min_interval {
                    let remaining = self.min_interval - elapsed;
                    debug!(?remaining, "sync cooling down");
                    return TriggerOutcome::CoolingDown { remaining };
                }
            }
            state.last_started = Some(Instant::now());
        }

        let engine = Arc::clone(&self.engine);
        let result = match tokio::task::spawn_blocking(move || engine.sync()).await {
            Ok(result) => result,
            Err(error) => SyncResult::failed(format!("sync task failed: {error}")),
        };
        self.notifier.notify(&result);

        let mut state = self.state.lock().await;
        if result.success {
            state.last_sync_at = Some(Utc::now());
        }
        state.last_result = Some(result.clone());
        TriggerOutcome::Ran(result)
    }

    pub async fn last_result(&self) -> Option<SyncResult> {
        self.state.lock().await.last_result.clone()
    }

    /// Wall-clock time of the last successful cycle.
    pub async fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_sync_at
    }
}
