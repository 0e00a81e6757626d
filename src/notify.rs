//! User-facing notifications.
//!
//! Inject an [`Arc<dyn NotificationSink>`] into
//! [`crate::WorkflowController::new`] to surface success and error messages.
//! Delivery is fire-and-forget: the controller never waits on a sink and never
//! learns whether the message was shown. Duplicates are not collapsed.
//!
//! # Example
//!
//! ```rust
//! use docflow::{Notification, NotificationSink};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct ErrorCounter(AtomicUsize);
//!
//! impl NotificationSink for ErrorCounter {
//!     fn notify(&self, n: Notification) {
//!         if n.kind.is_error() {
//!             self.0.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Severity of a notification; drives its colour in a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl NotificationKind {
    pub fn is_error(self) -> bool {
        matches!(self, NotificationKind::Error)
    }
}

/// A single toast-style message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    /// How long a view should keep it on screen before dismissing it.
    pub duration: Duration,
}

/// Receives notifications from the controller.
///
/// Implementations must be `Send + Sync`; the controller may be moved onto a
/// Tokio task. The default implementation drops everything.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification) {
        let _ = notification;
    }
}

/// Discards every notification.
pub struct NoopSink;

impl NotificationSink for NoopSink {}

/// Forwards notifications to `tracing` for headless use.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, n: Notification) {
        match n.kind {
            NotificationKind::Error => tracing::error!(target: "docflow::notify", "{}", n.message),
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!(target: "docflow::notify", "{}", n.message)
            }
        }
    }
}

/// Keeps every notification in memory, in arrival order.
///
/// Handy for views that poll, and for tests.
#[derive(Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Copy of everything received so far.
    pub fn all(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Remove and return everything received so far.
    pub fn drain(&self) -> Vec<Notification> {
        self.received
            .lock()
            .map(|mut v| std::mem::take(&mut *v))
            .unwrap_or_default()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.all().iter().filter(|n| n.kind == kind).count()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        if let Ok(mut v) = self.received.lock() {
            v.push(notification);
        }
    }
}

/// Convenience alias for the type the controller stores.
pub type SharedSink = Arc<dyn NotificationSink>;
