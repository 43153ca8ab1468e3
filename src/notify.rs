//! Best-effort toast notifications
//!
//! Failures are logged and dropped: a missing notification daemon must
//! never take the keyboard lock down with it.

use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

/// Application name shown on every toast
pub const APP_NAME: &str = "PawGate";

/// Errors reported by a toast backend
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification backend failed: {0}")]
    Backend(String),
}

/// Something that can display a toast
pub trait ToastBackend: Send + Sync {
    fn notify(&self, title: &str, message: &str, app_name: &str) -> Result<(), NotifyError>;
}

/// Desktop notifications through `notify-rust`
#[derive(Debug, Default, Clone, Copy)]
pub struct NotifyRustBackend;

impl ToastBackend for NotifyRustBackend {
    fn notify(&self, title: &str, message: &str, app_name: &str) -> Result<(), NotifyError> {
        notify_rust::Notification::new()
            .appname(app_name)
            .summary(title)
            .body(message)
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError::Backend(e.to_string()))
    }
}

/// Sends toasts when enabled in the configuration
#[derive(Clone)]
pub struct Notifier {
    backend: Arc<dyn ToastBackend>,
    enabled: bool,
}

impl Notifier {
    /// Create a notifier; when `enabled` is false every send is skipped
    pub fn new(backend: Arc<dyn ToastBackend>, enabled: bool) -> Self {
        Self { backend, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Show a toast on the calling thread, ignoring failures
    pub fn send(&self, title: &str, message: &str) {
        if !self.enabled {
            debug!(title, "notifications disabled, skipping");
            return;
        }
        deliver(self.backend.as_ref(), title, message);
    }

    /// Show a toast on a detached thread and return immediately
    pub fn send_in_thread(&self, title: &str, message: &str) {
        if !self.enabled {
            debug!(title, "notifications disabled, skipping");
            return;
        }

        let backend = Arc::clone(&self.backend);
        let title = title.to_string();
        let message = message.to_string();

        let spawned = thread::Builder::new()
            .name("notification".to_string())
            .spawn(move || deliver(backend.as_ref(), &title, &message));

        if let Err(e) = spawned {
            warn!(?e, "failed to spawn notification thread");
        }
    }
}

fn deliver(backend: &dyn ToastBackend, title: &str, message: &str) {
    match backend.notify(title, message, APP_NAME) {
        Ok(()) => debug!(title, "notification shown"),
        Err(e) => warn!(%e, title, "notification failed"),
    }
}
