use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::changelog::ChangelogPoller;
use crate::notify::{DedupGate, Notifier};

/// What a single run ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A new entry was handed to the notifier.
    Notified { id: String },
    /// The channel's latest announcement already mentions this entry.
    AlreadyPosted { id: String },
    /// The changelog could not be fetched or parsed.
    Unavailable,
    /// Another run was still in progress.
    Busy,
}

impl RunOutcome {
    pub fn log(&self) {
        match self {
            RunOutcome::Notified { id } => info!("✓ Posted changelog entry {}", id),
            RunOutcome::AlreadyPosted { id } => info!("Entry {} was already posted", id),
            RunOutcome::Unavailable => warn!("No changelog entry available this run"),
            RunOutcome::Busy => warn!("Skipped: previous run still in progress"),
        }
    }
}

/// Poll → dedup → post, one run at a time.
pub struct Orchestrator {
    poller: ChangelogPoller,
    gate: DedupGate,
    notifier: Notifier,
    alert_after_failures: u32,
    consecutive_failures: AtomicU32,
    running: Mutex<()>,
}

impl Orchestrator {
    pub fn new(poller: ChangelogPoller, gate: DedupGate, notifier: Notifier) -> Self {
        Self {
            poller,
            gate,
            notifier,
            alert_after_failures: 0,
            consecutive_failures: AtomicU32::new(0),
            running: Mutex::new(()),
        }
    }

    /// Post an alert to the channel once `n` consecutive scrapes have failed.
    pub fn with_failure_alert(mut self, n: u32) -> Self {
        self.alert_after_failures = n;
        self
    }

    pub async fn run_once(&self) -> RunOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("Previous changelog check still running, skipping this one");
            return RunOutcome::Busy;
        };

        let update = match self.poller.try_poll_latest().await {
            Ok(update) => {
                self.consecutive_failures.store(0, Ordering::Relaxed);
                update
            }
            Err(e) => {
                warn!("Error fetching changelog: {}", e);
                self.record_failure().await;
                return RunOutcome::Unavailable;
            }
        };

        let id = update.message.id;
        if self.gate.already_posted(&id).await {
            info!("Message with ID {} already exists in channel", id);
            return RunOutcome::AlreadyPosted { id };
        }

        info!(
            title = %update.entry.title,
            link = %update.entry.link,
            "Announcing new changelog entry"
        );
        self.notifier.post(&update.message.text).await;
        RunOutcome::Notified { id }
    }

    async fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if self.alert_after_failures != 0 && failures == self.alert_after_failures {
            self.notifier.post_alert(failures).await;
        }
    }
}
