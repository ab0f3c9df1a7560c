//! Interactive console standing in for the notification screen.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tabled::{Table, Tabled};

use notifsync_adapters::{ChannelScheduler, SessionIdentity};
use notifsync_core::traits::NavigationRouter;
use notifsync_core::types::{Destination, NotificationRecord, UserId};
use notifsync_engine::{
    Acknowledgement, CycleOutcome, NotificationSnapshot, SyncEngine, SyncStage, SyncStatus,
    relative_time,
};
use notifsync_worker::{AppState, LifecycleHandle};

/// Commands accepted on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Render the unread and read sections
    List,
    /// Open a notification from the list
    Open(String),
    /// Tap a delivered device notification
    Tap(String),
    /// Mark one notification read
    Read(String),
    /// Mark everything read
    ReadAll,
    /// Delete one notification
    Delete(String),
    /// Run a cycle now
    Retry,
    /// The notification screen regained focus
    Focus,
    /// The app moved to the background
    Background,
    /// The app returned to the foreground
    Foreground,
    /// Sign in as a user
    Login(String),
    /// Sign out
    Logout,
    /// Show sync status
    Status,
    /// Show available commands
    Help,
    /// Exit
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next().map(str::to_string);
        let require = |cmd: fn(String) -> Command| {
            arg.clone()
                .map(cmd)
                .ok_or_else(|| format!("'{name}' needs an id"))
        };

        match name.as_str() {
            "" | "list" | "ls" => Ok(Self::List),
            "open" => require(Self::Open),
            "tap" => require(Self::Tap),
            "read" => require(Self::Read),
            "read-all" => Ok(Self::ReadAll),
            "delete" | "rm" => require(Self::Delete),
            "retry" | "refresh" => Ok(Self::Retry),
            "focus" => Ok(Self::Focus),
            "background" | "bg" => Ok(Self::Background),
            "foreground" | "fg" => Ok(Self::Foreground),
            "login" => require(Self::Login),
            "logout" => Ok(Self::Logout),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("Unknown command '{other}'; type 'help'")),
        }
    }
}

const HELP: &str = "\
list                 show notifications
open <id>            open a notification from the list
tap <local-id>       tap a delivered device notification
read <id>            mark one read
read-all             mark all read
delete <id>          delete one
retry                refresh now
focus                screen regained focus
background | foreground
login <user> | logout
status | help | quit";

/// Router that prints where the app would navigate.
#[derive(Debug, Default)]
pub struct ConsoleRouter;

impl NavigationRouter for ConsoleRouter {
    fn navigate(&self, destination: &Destination) {
        println!("→ {}", destination.href());
    }
}

/// Console session state.
pub struct Console {
    /// Shared engine
    pub engine: Arc<SyncEngine>,
    /// Scheduler, for simulated taps
    pub scheduler: Arc<ChannelScheduler>,
    /// Session, for login and logout
    pub identity: Arc<SessionIdentity>,
    /// Mounted lifecycle controller
    pub lifecycle: LifecycleHandle,
}

impl Console {
    /// Run `command`. Returns `false` when the console should exit.
    pub async fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::List => {
                let snapshot = self.engine.store().snapshot();
                print!("{}", render_list(&snapshot, &self.engine.status(), Utc::now()));
            }
            Command::Open(id) => {
                if self.engine.open(&id).await.is_none() {
                    println!("No notification '{id}'");
                }
            }
            Command::Tap(local_id) => {
                if let Err(e) = self.scheduler.respond(&local_id) {
                    println!("{e}");
                }
            }
            Command::Read(id) => report(&id, self.engine.mark_one_read(&id).await),
            Command::ReadAll => report("all", self.engine.mark_all_read().await),
            Command::Delete(id) => report(&id, self.engine.delete(&id).await),
            Command::Retry => match self.engine.retry().await {
                CycleOutcome::Completed(report) => println!(
                    "Refreshed: {} fetched, {} new",
                    report.fetched,
                    report.materialized.len()
                ),
                CycleOutcome::Failed(failure) => println!("Refresh failed: {}", failure.message),
                CycleOutcome::Skipped => println!("A refresh is already running"),
                CycleOutcome::Superseded => println!("Refresh discarded; the session changed"),
                CycleOutcome::Unauthenticated => println!("Not signed in"),
            },
            Command::Focus => {
                self.lifecycle.focus_gained();
            }
            Command::Background => {
                self.lifecycle.app_state_changed(AppState::Background);
            }
            Command::Foreground => {
                self.lifecycle.app_state_changed(AppState::Foreground);
            }
            Command::Login(user) => {
                self.identity.sign_in(UserId::new(user));
                self.engine.reset();
                self.lifecycle.focus_gained();
            }
            Command::Logout => {
                self.identity.sign_out();
                self.engine.reset();
            }
            Command::Status => print!("{}", render_status(&self.engine.status())),
            Command::Help => println!("{HELP}"),
            Command::Quit => {
                self.lifecycle.unmount().await;
                return false;
            }
        }
        true
    }
}

fn report(target: &str, ack: Acknowledgement) {
    match ack {
        Acknowledgement::NotFound => println!("No notification '{target}'"),
        Acknowledgement::Unchanged => println!("Nothing to change"),
        Acknowledgement::LocalOnly | Acknowledgement::Confirmed => println!("✓ {target}"),
        // Optimistic: the local change stands and the next refresh corrects it.
        Acknowledgement::Failed { .. } => println!("✓ {target}"),
    }
}

/// Render the notification screen: error banner, unread section, read
/// section.
pub fn render_list(snapshot: &NotificationSnapshot, status: &SyncStatus, now: DateTime<Utc>) -> String {
    let mut out = String::new();

    if let Some(failure) = status.last_error.as_ref().filter(|f| f.stage == SyncStage::Fetch) {
        out.push_str(&format!("⚠ Couldn't refresh ({}). Type 'retry'.\n", failure.message));
    }
    if snapshot.is_empty() {
        out.push_str("No notifications yet\n");
        return out;
    }

    out.push_str(&format!("Unread ({})\n", snapshot.unread_count()));
    let unread: Vec<NotificationRow> = snapshot
        .unread()
        .map(|r| NotificationRow::new(r, now))
        .collect();
    if !unread.is_empty() {
        out.push_str(&format!("{}\n", Table::new(unread)));
    }
    let read: Vec<NotificationRow> = snapshot
        .read()
        .map(|r| NotificationRow::new(r, now))
        .collect();
    if !read.is_empty() {
        out.push_str(&format!("Read\n{}\n", Table::new(read)));
    }
    out
}

#[derive(Debug, Tabled)]
struct NotificationRow {
    /// Notification ID
    #[tabled(rename = "ID")]
    id: String,
    /// Icon
    #[tabled(rename = "Icon")]
    icon: String,
    /// Title
    #[tabled(rename = "Title")]
    title: String,
    /// Message
    #[tabled(rename = "Message")]
    body: String,
    /// Received
    #[tabled(rename = "Received")]
    received: String,
}

impl NotificationRow {
    fn new(record: &NotificationRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone(),
            icon: record.kind.icon().to_string(),
            title: record.title.clone(),
            body: record.body.clone(),
            received: relative_time(record.created_at, now),
        }
    }
}

/// Render the sync status block.
pub fn render_status(status: &SyncStatus) -> String {
    let last_success = status
        .cursor
        .last_success_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    let mut out = format!(
        "phase: {:?}\npolling: {}\nlast success: {}\n",
        status.phase, status.cursor.polling, last_success
    );
    if let Some(failure) = &status.last_error {
        out.push_str(&format!(
            "last error: {:?} {} ({})\n",
            failure.stage,
            failure.record_id.as_deref().unwrap_or("-"),
            failure.message
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use notifsync_core::error::AppError;
    use notifsync_engine::{NotificationStore, SyncFailure};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("".parse::<Command>(), Ok(Command::List));
        assert_eq!("open 42".parse::<Command>(), Ok(Command::Open("42".into())));
        assert_eq!("READ-ALL".parse::<Command>(), Ok(Command::ReadAll));
        assert_eq!("bg".parse::<Command>(), Ok(Command::Background));
        assert_eq!("login u7".parse::<Command>(), Ok(Command::Login("u7".into())));
    }

    #[test]
    fn test_parse_rejects_missing_id_and_unknown() {
        assert!("delete".parse::<Command>().unwrap_err().contains("needs an id"));
        assert!("frobnicate".parse::<Command>().unwrap_err().contains("Unknown"));
    }

    #[test]
    fn test_render_list_sections() {
        let store = NotificationStore::new();
        let mut read = NotificationRecord::remote("r1", "Old", "seen", now() - Duration::hours(2));
        read.read = true;
        store.replace_all(vec![
            read,
            NotificationRecord::remote("r2", "New", "fresh", now() - Duration::minutes(5)),
        ]);

        let out = render_list(&store.snapshot(), &SyncStatus::default(), now());

        let unread_at = out.find("Unread (1)").unwrap();
        let read_at = out.find("Read\n").unwrap();
        let r2_at = out.find("r2").unwrap();
        assert!(unread_at < r2_at && r2_at < read_at);
        assert!(read_at < out.find("r1").unwrap());
        assert_eq!(out.matches("Received").count(), 2);
        assert!(out.contains("5 minutes ago"));
        assert!(out.contains("2 hours ago"));
        assert!(!out.contains("Couldn't refresh"));
    }

    #[test]
    fn test_render_list_omits_empty_read_section() {
        let store = NotificationStore::new();
        store.replace_all(vec![NotificationRecord::remote(
            "r7",
            "Sale",
            "20% off",
            now() - Duration::minutes(1),
        )]);

        let out = render_list(&store.snapshot(), &SyncStatus::default(), now());

        assert!(out.starts_with("Unread (1)\n"));
        assert!(out.contains("r7") && out.contains("Sale"));
        assert!(!out.contains("Read\n"));
    }

    #[test]
    fn test_render_list_shows_retry_banner_after_fetch_failure() {
        let status = SyncStatus {
            last_error: Some(SyncFailure::new(
                SyncStage::Fetch,
                None,
                &AppError::network("offline"),
            )),
            ..SyncStatus::default()
        };

        let out = render_list(&NotificationSnapshot::default(), &status, now());

        assert!(out.starts_with("⚠ Couldn't refresh (offline)"));
        assert!(out.contains("No notifications yet"));
    }
}
