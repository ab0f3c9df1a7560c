//! Test doubles shared by the engine integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::{Semaphore, broadcast};

use notifsync_adapters::SessionIdentity;
use notifsync_core::config::SyncConfig;
use notifsync_core::error::AppError;
use notifsync_core::result::AppResult;
use notifsync_core::traits::{LocalScheduler, NavigationRouter, NotificationFeed, PermissionStatus};
use notifsync_core::types::{
    Destination, LocalContent, NotificationRecord, NotificationResponse, UserId,
};
use notifsync_engine::{NotificationStore, SyncDeps, SyncEngine};

pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn remote(id: &str, minutes: i64) -> NotificationRecord {
    NotificationRecord::remote(id, format!("Title {id}"), format!("Body {id}"), at(minutes))
}

/// Backend double: an upstream unread list plus call recording.
#[derive(Debug)]
pub struct MockFeed {
    pub upstream: Mutex<Vec<NotificationRecord>>,
    pub remove_on_ack: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub fail_mutations: AtomicBool,
    pub fail_ack: Mutex<HashSet<String>>,
    pub fetch_calls: AtomicUsize,
    pub ack_attempts: Mutex<Vec<String>>,
    pub acked: Mutex<Vec<String>>,
    pub acked_all: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockFeed {
    pub fn new(upstream: Vec<NotificationRecord>) -> Self {
        Self {
            upstream: Mutex::new(upstream),
            remove_on_ack: AtomicBool::new(true),
            fail_fetch: AtomicBool::new(false),
            fail_mutations: AtomicBool::new(false),
            fail_ack: Mutex::new(HashSet::new()),
            fetch_calls: AtomicUsize::new(0),
            ack_attempts: Mutex::new(Vec::new()),
            acked: Mutex::new(Vec::new()),
            acked_all: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// A feed whose fetches block until the returned semaphore gets permits.
    pub fn gated(upstream: Vec<NotificationRecord>) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let feed = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::new(upstream)
        };
        (feed, gate)
    }

    pub fn fail_ack_for(&self, id: &str) {
        self.fail_ack.lock().unwrap().insert(id.to_string());
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn acked(&self) -> Vec<String> {
        self.acked.lock().unwrap().clone()
    }

    pub fn ack_attempts(&self) -> Vec<String> {
        self.ack_attempts.lock().unwrap().clone()
    }

    pub fn set_upstream(&self, records: Vec<NotificationRecord>) {
        *self.upstream.lock().unwrap() = records;
    }
}

#[async_trait]
impl NotificationFeed for MockFeed {
    async fn fetch_unread(&self, _user: &UserId) -> AppResult<Vec<NotificationRecord>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.map_err(|_| AppError::internal("gate closed"))?;
            permit.forget();
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(AppError::network("connection reset"));
        }
        Ok(self.upstream.lock().unwrap().clone())
    }

    async fn acknowledge_one(&self, remote_id: &str) -> AppResult<()> {
        self.ack_attempts.lock().unwrap().push(remote_id.to_string());
        if self.fail_mutations.load(Ordering::SeqCst)
            || self.fail_ack.lock().unwrap().contains(remote_id)
        {
            return Err(AppError::http_status(500, "ack failed"));
        }
        if self.remove_on_ack.load(Ordering::SeqCst) {
            self.upstream.lock().unwrap().retain(|r| r.id != remote_id);
        }
        self.acked.lock().unwrap().push(remote_id.to_string());
        Ok(())
    }

    async fn acknowledge_all(&self, _user: &UserId) -> AppResult<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(AppError::http_status(502, "bad gateway"));
        }
        self.acked_all.fetch_add(1, Ordering::SeqCst);
        self.upstream.lock().unwrap().clear();
        Ok(())
    }

    async fn delete_one(&self, remote_id: &str) -> AppResult<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(AppError::network("timeout"));
        }
        self.upstream.lock().unwrap().retain(|r| r.id != remote_id);
        self.deleted.lock().unwrap().push(remote_id.to_string());
        Ok(())
    }
}

/// Scheduler double recording every scheduled notification.
#[derive(Debug)]
pub struct RecordingScheduler {
    pub permission: Mutex<PermissionStatus>,
    pub fail: AtomicBool,
    pub permission_requests: AtomicUsize,
    pub scheduled: Mutex<Vec<LocalContent>>,
    responses: broadcast::Sender<NotificationResponse>,
}

impl RecordingScheduler {
    pub fn new(permission: PermissionStatus) -> Self {
        let (responses, _) = broadcast::channel(16);
        Self {
            permission: Mutex::new(permission),
            fail: AtomicBool::new(false),
            permission_requests: AtomicUsize::new(0),
            scheduled: Mutex::new(Vec::new()),
            responses,
        }
    }

    pub fn scheduled(&self) -> Vec<LocalContent> {
        self.scheduled.lock().unwrap().clone()
    }
}

#[async_trait]
impl LocalScheduler for RecordingScheduler {
    async fn permission_status(&self) -> PermissionStatus {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> PermissionStatus {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        let mut permission = self.permission.lock().unwrap();
        if *permission == PermissionStatus::Undetermined {
            *permission = PermissionStatus::Granted;
        }
        *permission
    }

    async fn schedule(&self, content: LocalContent) -> AppResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::scheduler("device API unavailable"));
        }
        let handle = content.local_id.clone();
        self.scheduled.lock().unwrap().push(content);
        Ok(handle)
    }

    fn subscribe(&self) -> broadcast::Receiver<NotificationResponse> {
        self.responses.subscribe()
    }
}

/// Router double recording destinations.
#[derive(Debug, Default)]
pub struct RecordingRouter {
    pub destinations: Mutex<Vec<Destination>>,
}

impl RecordingRouter {
    pub fn destinations(&self) -> Vec<Destination> {
        self.destinations.lock().unwrap().clone()
    }
}

impl NavigationRouter for RecordingRouter {
    fn navigate(&self, destination: &Destination) {
        self.destinations.lock().unwrap().push(destination.clone());
    }
}

/// An engine wired to test doubles, signed in as `u1`.
pub struct Harness {
    pub engine: Arc<SyncEngine>,
    pub feed: Arc<MockFeed>,
    pub scheduler: Arc<RecordingScheduler>,
    pub router: Arc<RecordingRouter>,
    pub identity: Arc<SessionIdentity>,
}

impl Harness {
    pub fn new(upstream: Vec<NotificationRecord>) -> Self {
        Self::build(MockFeed::new(upstream), PermissionStatus::Granted, SyncConfig::default())
    }

    pub fn build(feed: MockFeed, permission: PermissionStatus, config: SyncConfig) -> Self {
        let feed = Arc::new(feed);
        let scheduler = Arc::new(RecordingScheduler::new(permission));
        let router = Arc::new(RecordingRouter::default());
        let identity = Arc::new(SessionIdentity::default());
        identity.sign_in(UserId::from("u1"));

        let deps = SyncDeps {
            feed: feed.clone(),
            scheduler: scheduler.clone(),
            identity: identity.clone(),
            router: router.clone(),
        };
        let engine = Arc::new(SyncEngine::new(
            deps,
            Arc::new(NotificationStore::new()),
            config,
        ));

        Self {
            engine,
            feed,
            scheduler,
            router,
            identity,
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.engine
            .store()
            .read_with(|s| s.records().iter().map(|r| r.id.clone()).collect())
    }
}
