use std::{fmt, sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle};

pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_millis(3500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotification {
    pub kind: NotificationKind,
    pub text: String,
}

impl StatusNotification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Default)]
struct Slot {
    current: Option<StatusNotification>,
    generation: u64,
    expiry: Option<JoinHandle<()>>,
}

/// Holds at most one notification and the single timer that will clear it.
pub struct NotificationCenter {
    ttl: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Replaces the current notification and restarts the expiry timer.
    pub async fn show(&self, notification: StatusNotification) {
        let mut slot = self.slot.lock().await;
        if let Some(previous) = slot.expiry.take() {
            previous.abort();
        }
        slot.generation += 1;
        slot.current = Some(notification);

        let generation = slot.generation;
        let ttl = self.ttl;
        let shared = Arc::clone(&self.slot);
        slot.expiry = Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut slot = shared.lock().await;
            if slot.generation == generation {
                slot.current = None;
                slot.expiry = None;
            }
        }));
    }

    pub async fn current(&self) -> Option<StatusNotification> {
        self.slot.lock().await.current.clone()
    }

    pub async fn dismiss(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(timer) = slot.expiry.take() {
            timer.abort();
        }
        slot.generation += 1;
        slot.current = None;
    }
}

impl Drop for NotificationCenter {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.try_lock() {
            if let Some(timer) = slot.expiry.take() {
                timer.abort();
            }
        }
    }
}
