//! One fetch, merge, materialize, acknowledge pass.

use std::sync::atomic::Ordering;

use chrono::Utc;
use tracing::{debug, error, info, trace, warn};

use notifsync_core::traits::PermissionStatus;
use notifsync_core::types::{LocalContent, NotificationRecord, generate_local_id, is_local_id};

use super::{CycleOutcome, CycleReport, SyncEngine, SyncFailure, SyncPhase, SyncStage};

/// Holds the re-entrancy flag for the duration of a cycle.
///
/// Dropping the guard clears the flag and leaves any running phase, also
/// when the cycle future is cancelled mid-way.
struct CycleGuard<'a> {
    engine: &'a SyncEngine,
}

impl<'a> CycleGuard<'a> {
    fn acquire(engine: &'a SyncEngine) -> Option<Self> {
        engine
            .cycle_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { engine })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.engine.status.send_if_modified(|s| {
            if s.phase.is_running() {
                s.phase = SyncPhase::Idle;
                true
            } else {
                false
            }
        });
        self.engine.cycle_in_progress.store(false, Ordering::Release);
    }
}

impl SyncEngine {
    /// Run one polling cycle.
    ///
    /// Returns [`CycleOutcome::Skipped`] without touching anything if another
    /// cycle is in flight. A fetch failure leaves the store untouched and is
    /// published as the engine's error; per-record failures are isolated.
    /// A [`SyncEngine::reset`] while the cycle is suspended makes it stop
    /// before its next write.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Some(_guard) = CycleGuard::acquire(self) else {
            debug!("Sync cycle already in progress; skipping");
            return CycleOutcome::Skipped;
        };
        let generation = self.generation.load(Ordering::Acquire);

        let Some(user) = self.identity.current_user().await else {
            trace!("No signed-in user; skipping sync cycle");
            return CycleOutcome::Unauthenticated;
        };

        self.set_phase(SyncPhase::Fetching);
        let fetched = self.feed.fetch_unread(&user).await;
        if self.superseded(generation) {
            debug!(user = %user, "Engine reset during fetch; discarding result");
            return CycleOutcome::Superseded;
        }
        let fetched = match fetched {
            Ok(records) => records,
            Err(e) => {
                error!(user = %user, error = %e, "Failed to fetch unread notifications");
                let failure = SyncFailure::new(SyncStage::Fetch, None, &e);
                self.status.send_modify(|s| {
                    s.phase = SyncPhase::Error;
                    s.last_error = Some(failure.clone());
                });
                return CycleOutcome::Failed(failure);
            }
        };

        self.set_phase(SyncPhase::Merging);
        let mut report = CycleReport {
            fetched: fetched.len(),
            ..CycleReport::default()
        };
        self.store.replace_remote(fetched);
        let fetched_at = Utc::now();
        self.status.send_modify(|s| s.cursor.last_success_at = Some(fetched_at));

        for record in self.novel_records() {
            if !self.surface(record, &mut report, generation).await {
                debug!(user = %user, "Engine reset during sync cycle; stopping");
                return CycleOutcome::Superseded;
            }
        }

        self.status.send_modify(|s| {
            s.phase = SyncPhase::Idle;
            s.last_error = report.failures.first().cloned();
        });

        if report.materialized.is_empty() && report.failures.is_empty() {
            debug!(user = %user, fetched = report.fetched, "Sync cycle complete");
        } else {
            info!(
                user = %user,
                fetched = report.fetched,
                materialized = report.materialized.len(),
                acknowledged = report.acknowledged.len(),
                failures = report.failures.len(),
                "Sync cycle complete"
            );
        }
        CycleOutcome::Completed(report)
    }

    /// Run a cycle on user request (the retry control).
    pub async fn retry(&self) -> CycleOutcome {
        self.run_cycle().await
    }

    /// Unread remote records with no local echo and never materialized.
    fn novel_records(&self) -> Vec<NotificationRecord> {
        let materialized = self.materialized.lock().unwrap_or_else(|e| e.into_inner());
        self.store.read_with(|snapshot| {
            snapshot
                .records()
                .iter()
                .filter(|r| !r.is_local && !r.read)
                .filter(|r| !snapshot.has_echo_for(&r.id) && !materialized.contains(&r.id))
                .cloned()
                .collect()
        })
    }

    /// Materialize `record`, then acknowledge it upstream. Never in the
    /// other order: an acknowledged but unmaterialized record is lost.
    ///
    /// Returns `false` when the engine was reset meanwhile.
    async fn surface(
        &self,
        record: NotificationRecord,
        report: &mut CycleReport,
        generation: u64,
    ) -> bool {
        self.set_phase(SyncPhase::Materializing);
        match self.materialize(&record, generation).await {
            None => return false,
            Some(false) => report.schedule_failures += 1,
            Some(true) => {}
        }
        report.materialized.push(record.id.clone());

        if is_local_id(&record.id) {
            return true;
        }

        self.set_phase(SyncPhase::Acknowledging);
        let acknowledged = self.feed.acknowledge_one(&record.id).await;
        if self.superseded(generation) {
            return false;
        }
        match acknowledged {
            Ok(()) => report.acknowledged.push(record.id),
            Err(e) => {
                warn!(
                    remote_id = %record.id,
                    error = %e,
                    "Failed to acknowledge materialized notification"
                );
                report
                    .failures
                    .push(SyncFailure::new(SyncStage::Acknowledge, Some(&record.id), &e));
            }
        }
        true
    }

    /// Schedule a device notification for `record` and insert its echo.
    ///
    /// The echo is inserted even when scheduling is skipped or fails, so the
    /// notification is still visible in-app; the source record is mirrored
    /// read in the same update so it is not counted twice. Returns
    /// `Some(false)` on a scheduling failure and `None` when the engine was
    /// reset before the echo could be inserted.
    async fn materialize(&self, record: &NotificationRecord, generation: u64) -> Option<bool> {
        let now = Utc::now();
        let echo = record.echo(generate_local_id(now), record.created_at);
        let mut scheduled = true;

        if self.ensure_permission().await {
            match self.scheduler.schedule(LocalContent::for_echo(&echo)).await {
                Ok(handle) => {
                    debug!(remote_id = %record.id, local_id = %echo.id, %handle, "Scheduled device notification");
                }
                Err(e) => {
                    warn!(remote_id = %record.id, error = %e, "Failed to schedule device notification");
                    scheduled = false;
                }
            }
        } else {
            debug!(remote_id = %record.id, "Notification permission denied; not scheduling");
        }

        let mut materialized = self.materialized.lock().unwrap_or_else(|e| e.into_inner());
        if self.superseded(generation) {
            return None;
        }
        materialized.insert(record.id.clone());
        self.store.upsert_echo(echo);
        Some(scheduled)
    }

    /// Check, and if undecided request, scheduler permission. A decided
    /// answer is cached for the life of the engine.
    async fn ensure_permission(&self) -> bool {
        let cached = *self.permission.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(status) = cached {
            return status.is_granted();
        }

        let status = match self.scheduler.permission_status().await {
            PermissionStatus::Undetermined => self.scheduler.request_permission().await,
            decided => decided,
        };
        if status != PermissionStatus::Undetermined {
            *self.permission.lock().unwrap_or_else(|e| e.into_inner()) = Some(status);
        }
        info!(?status, "Notification permission resolved");
        status.is_granted()
    }
}
