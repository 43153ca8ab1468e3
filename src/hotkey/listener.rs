//! Global hotkey listener
//!
//! Registers one system-wide hotkey and turns each press into a `true`
//! signal on an unbounded queue. The press callback runs on the OS hook
//! thread, so it only enqueues; the lock state machine does the rest.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Callback invoked on the OS hook thread when a hotkey is pressed
pub type HotkeyCallback = Arc<dyn Fn() + Send + Sync>;

/// Identifies one registration within a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(pub u32);

/// System-wide hotkey registration service
pub trait HotkeyBackend {
    /// Register `hotkey`, invoking `callback` on every press
    fn register(&self, hotkey: &str, callback: HotkeyCallback) -> Result<RegistrationId, HotkeyError>;

    /// Remove a registration made by [`HotkeyBackend::register`]
    fn unregister(&self, id: RegistrationId) -> Result<(), HotkeyError>;
}

/// Errors that can occur registering a hotkey
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("invalid hotkey '{hotkey}': {reason}")]
    InvalidHotkey { hotkey: String, reason: String },

    #[error("hotkey '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("unknown hotkey registration {0:?}")]
    UnknownRegistration(RegistrationId),

    #[error("hotkey backend error: {0}")]
    Backend(String),
}

/// Owns a single hotkey registration for its lifetime
pub struct HotkeyListener {
    hotkey: String,
    backend: Arc<dyn HotkeyBackend>,
    registration: Option<RegistrationId>,
}

impl HotkeyListener {
    /// Register `hotkey` and start forwarding presses to `signal_tx`
    pub fn new(
        backend: Arc<dyn HotkeyBackend>,
        signal_tx: mpsc::UnboundedSender<bool>,
        hotkey: &str,
    ) -> Result<Self, HotkeyError> {
        let callback: HotkeyCallback = Arc::new(move || {
            // Non-blocking; a closed queue only means we're shutting down
            if signal_tx.send(true).is_err() {
                debug!("hotkey pressed after signal queue closed");
            }
        });

        let id = backend.register(hotkey, callback)?;
        info!(hotkey, ?id, "hotkey registered");

        Ok(Self {
            hotkey: hotkey.to_string(),
            backend,
            registration: Some(id),
        })
    }

    /// Deregister the hotkey. Calling this more than once is a no-op.
    pub fn stop(&mut self) {
        let Some(id) = self.registration.take() else {
            return;
        };

        match self.backend.unregister(id) {
            Ok(()) => info!(hotkey = %self.hotkey, "hotkey unregistered"),
            Err(e) => warn!(?e, hotkey = %self.hotkey, "failed to unregister hotkey"),
        }
    }

    /// Whether the hotkey is still registered with the backend
    pub fn is_running(&self) -> bool {
        self.registration.is_some()
    }

    /// The hotkey string this listener was created with
    pub fn hotkey(&self) -> &str {
        &self.hotkey
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Backend that records calls instead of touching the OS
    #[derive(Default)]
    struct RecordingBackend {
        registered: Mutex<Vec<String>>,
        callbacks: Mutex<Vec<HotkeyCallback>>,
        unregistered: Mutex<Vec<RegistrationId>>,
        reject: bool,
    }

    impl RecordingBackend {
        fn rejecting() -> Self {
            Self {
                reject: true,
                ..Default::default()
            }
        }

        fn reset(&self) {
            self.registered.lock().unwrap().clear();
            self.callbacks.lock().unwrap().clear();
            self.unregistered.lock().unwrap().clear();
        }

        fn press(&self, index: usize) {
            let callback = self.callbacks.lock().unwrap()[index].clone();
            callback();
        }
    }

    impl HotkeyBackend for RecordingBackend {
        fn register(&self, hotkey: &str, callback: HotkeyCallback) -> Result<RegistrationId, HotkeyError> {
            if self.reject {
                return Err(HotkeyError::InvalidHotkey {
                    hotkey: hotkey.to_string(),
                    reason: "rejected".to_string(),
                });
            }
            let mut registered = self.registered.lock().unwrap();
            registered.push(hotkey.to_string());
            self.callbacks.lock().unwrap().push(callback);
            Ok(RegistrationId(registered.len() as u32))
        }

        fn unregister(&self, id: RegistrationId) -> Result<(), HotkeyError> {
            self.unregistered.lock().unwrap().push(id);
            Ok(())
        }
    }

    #[test]
    fn test_listener_registers_hotkey() {
        let backend = Arc::new(RecordingBackend::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let listener = HotkeyListener::new(backend.clone(), tx, "ctrl+b").unwrap();

        assert!(listener.is_running());
        assert_eq!(listener.hotkey(), "ctrl+b");
        assert_eq!(*backend.registered.lock().unwrap(), vec!["ctrl+b".to_string()]);
    }

    #[test]
    fn test_callback_puts_signal_in_queue() {
        let backend = Arc::new(RecordingBackend::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let _listener = HotkeyListener::new(backend.clone(), tx, "ctrl+b").unwrap();
        assert!(rx.try_recv().is_err());

        backend.press(0);

        assert_eq!(rx.try_recv().unwrap(), true);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_complex_hotkeys_register_independently() {
        let backend = Arc::new(RecordingBackend::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        for hotkey in ["ctrl+b", "ctrl+shift+l", "ctrl+alt+f12", "ctrl+shift+alt+p", "win+pause"] {
            backend.reset();
            let _listener = HotkeyListener::new(backend.clone(), tx.clone(), hotkey).unwrap();
            assert_eq!(*backend.registered.lock().unwrap(), vec![hotkey.to_string()]);
        }
    }

    #[test]
    fn test_invalid_hotkey_is_recoverable() {
        let backend = Arc::new(RecordingBackend::rejecting());
        let (tx, _rx) = mpsc::unbounded_channel();

        let result = HotkeyListener::new(backend, tx, "invalid+++hotkey");
        assert!(matches!(result, Err(HotkeyError::InvalidHotkey { .. })));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let backend = Arc::new(RecordingBackend::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let mut listener = HotkeyListener::new(backend.clone(), tx, "ctrl+b").unwrap();
        listener.stop();
        listener.stop();

        assert!(!listener.is_running());
        assert_eq!(*backend.unregistered.lock().unwrap(), vec![RegistrationId(1)]);

        drop(listener);
        assert_eq!(backend.unregistered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_drop_unregisters() {
        let backend = Arc::new(RecordingBackend::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        drop(HotkeyListener::new(backend.clone(), tx, "ctrl+b").unwrap());

        assert_eq!(backend.unregistered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_press_after_queue_closed_does_not_panic() {
        let backend = Arc::new(RecordingBackend::default());
        let (tx, rx) = mpsc::unbounded_channel();

        let _listener = HotkeyListener::new(backend.clone(), tx, "ctrl+b").unwrap();
        drop(rx);

        backend.press(0);
    }
}
