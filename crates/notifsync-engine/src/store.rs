//! In-memory notification store.
//!
//! The store is the only owner of notification state in the process. Every
//! mutation is applied to the current [`NotificationSnapshot`] in a single
//! `watch` update, so readers either see the state before a mutation or the
//! state after it, never a mix.

use std::collections::HashSet;

use tokio::sync::watch;
use tracing::trace;

use notifsync_core::types::NotificationRecord;

/// A committed view of the notification list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationSnapshot {
    /// Records, newest first.
    records: Vec<NotificationRecord>,
    /// Mirror of the number of unread records.
    unread_count: usize,
}

impl NotificationSnapshot {
    /// Records, newest first.
    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    /// Number of unread records.
    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Whether a record with `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Unread section, newest first.
    pub fn unread(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter().filter(|r| !r.read)
    }

    /// Read section, newest first.
    pub fn read(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter().filter(|r| r.read)
    }

    /// Device-scheduled echoes of remote records.
    pub fn local_echoes(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter().filter(|r| r.is_local)
    }

    /// Whether a local echo of `remote_id` is present.
    pub fn has_echo_for(&self, remote_id: &str) -> bool {
        self.local_echoes()
            .any(|r| r.source_id.as_deref() == Some(remote_id))
    }

    fn derived_unread(&self) -> usize {
        self.records.iter().filter(|r| !r.read).count()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}

/// Process-wide notification store.
#[derive(Debug)]
pub struct NotificationStore {
    state: watch::Sender<NotificationSnapshot>,
}

impl NotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (state, _) = watch::channel(NotificationSnapshot::default());
        Self { state }
    }

    /// Clone the latest committed snapshot.
    pub fn snapshot(&self) -> NotificationSnapshot {
        self.state.borrow().clone()
    }

    /// Run `f` against the latest committed snapshot without cloning it.
    pub fn read_with<R>(&self, f: impl FnOnce(&NotificationSnapshot) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Number of unread records.
    pub fn unread_count(&self) -> usize {
        self.state.borrow().unread_count
    }

    /// Receive every committed snapshot from now on.
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.state.subscribe()
    }

    /// Replace the whole list with `records`.
    ///
    /// The list is sorted newest first, duplicate ids are dropped (the newest
    /// occurrence wins), and the unread count is recomputed from scratch.
    pub fn replace_all(&self, records: Vec<NotificationRecord>) {
        let next = normalize(records);
        trace!(
            records = next.records.len(),
            unread = next.unread_count,
            "Replacing notification list"
        );
        self.state.send_replace(next);
    }

    /// Replace every remote record with `remote`, keeping the local echoes
    /// currently held, as one atomic transition.
    ///
    /// A remote record that already has an echo is mirrored as read: the echo
    /// carries its unread state, so it is counted once even while the backend
    /// still reports it unread.
    pub fn replace_remote(&self, remote: Vec<NotificationRecord>) {
        self.state.send_modify(|snapshot| {
            let echoes: Vec<NotificationRecord> = snapshot.local_echoes().cloned().collect();
            let echo_ids: HashSet<&str> = echoes.iter().map(|r| r.id.as_str()).collect();
            let shadowed: HashSet<&str> =
                echoes.iter().filter_map(|r| r.source_id.as_deref()).collect();
            let mut records: Vec<NotificationRecord> = remote
                .into_iter()
                .filter(|r| !r.is_local && !echo_ids.contains(r.id.as_str()))
                .map(|mut r| {
                    if shadowed.contains(r.id.as_str()) {
                        r.read = true;
                    }
                    r
                })
                .collect();
            records.extend(echoes.iter().cloned());
            *snapshot = normalize(records);
        });
    }

    /// Insert `record` unless its id is already present.
    ///
    /// Returns whether the record was inserted.
    pub fn upsert_local(&self, record: NotificationRecord) -> bool {
        self.state.send_if_modified(|snapshot| {
            if snapshot.contains(&record.id) {
                return false;
            }
            if !record.read {
                snapshot.unread_count += 1;
            }
            let at = snapshot
                .records
                .partition_point(|r| r.created_at >= record.created_at);
            snapshot.records.insert(at, record);
            debug_assert_eq!(snapshot.unread_count, snapshot.derived_unread());
            true
        })
    }

    /// Insert a local `echo` and mirror its source record as read, in one
    /// update.
    ///
    /// Returns whether the echo was inserted. The source is marked read even
    /// when the echo was already present.
    pub fn upsert_echo(&self, echo: NotificationRecord) -> bool {
        let mut inserted = false;
        self.state.send_if_modified(|snapshot| {
            let mut changed = false;
            if let Some(source) = echo
                .source_id
                .as_deref()
                .and_then(|id| snapshot.position(id))
            {
                if !snapshot.records[source].read {
                    snapshot.records[source].read = true;
                    snapshot.unread_count = snapshot.unread_count.saturating_sub(1);
                    changed = true;
                }
            }
            if !snapshot.contains(&echo.id) {
                if !echo.read {
                    snapshot.unread_count += 1;
                }
                let at = snapshot
                    .records
                    .partition_point(|r| r.created_at >= echo.created_at);
                snapshot.records.insert(at, echo.clone());
                inserted = true;
                changed = true;
            }
            debug_assert_eq!(snapshot.unread_count, snapshot.derived_unread());
            changed
        });
        inserted
    }

    /// Mark the record `id` read.
    ///
    /// Returns `false` when the record is absent or already read.
    pub fn mark_read(&self, id: &str) -> bool {
        self.state.send_if_modified(|snapshot| {
            let Some(at) = snapshot.position(id) else {
                return false;
            };
            if snapshot.records[at].read {
                return false;
            }
            snapshot.records[at].read = true;
            snapshot.unread_count = snapshot.unread_count.saturating_sub(1);
            debug_assert_eq!(snapshot.unread_count, snapshot.derived_unread());
            true
        })
    }

    /// Mark every record read. Returns how many records changed.
    pub fn mark_all_read(&self) -> usize {
        let mut changed = 0;
        self.state.send_if_modified(|snapshot| {
            for record in snapshot.records.iter_mut().filter(|r| !r.read) {
                record.read = true;
                changed += 1;
            }
            snapshot.unread_count = 0;
            changed > 0
        });
        changed
    }

    /// Delete the record `id`, returning it if it was present.
    pub fn remove(&self, id: &str) -> Option<NotificationRecord> {
        let mut removed = None;
        self.state.send_if_modified(|snapshot| {
            let Some(at) = snapshot.position(id) else {
                return false;
            };
            let record = snapshot.records.remove(at);
            if !record.read {
                snapshot.unread_count = snapshot.unread_count.saturating_sub(1);
            }
            debug_assert_eq!(snapshot.unread_count, snapshot.derived_unread());
            removed = Some(record);
            true
        });
        removed
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(mut records: Vec<NotificationRecord>) -> NotificationSnapshot {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let mut seen = HashSet::with_capacity(records.len());
    records.retain(|r| seen.insert(r.id.clone()));
    let unread_count = records.iter().filter(|r| !r.read).count();
    NotificationSnapshot {
        records,
        unread_count,
    }
}
