//! Lock state machine
//!
//! Consumes hotkey signals and toggles between Unlocked and Locked,
//! announcing each transition as a broadcast event and a toast.

use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::events::LockEvent;
use crate::notify::Notifier;

/// Keyboard lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    /// Keyboard input passes through
    #[default]
    Unlocked,
    /// Keyboard input is blocked
    Locked,
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockState::Unlocked => write!(f, "Unlocked"),
            LockState::Locked => write!(f, "Locked"),
        }
    }
}

/// Toggles the lock on each hotkey signal
pub struct LockController {
    state: LockState,
    /// Time the keyboard was locked, while locked
    locked_at: Option<Instant>,
    /// Display form of the toggle hotkey, used in toasts
    hotkey_label: String,
    notifier: Notifier,
    event_tx: broadcast::Sender<LockEvent>,
}

impl LockController {
    /// Create a new controller in the unlocked state
    pub fn new(notifier: Notifier, event_tx: broadcast::Sender<LockEvent>, hotkey_label: impl Into<String>) -> Self {
        Self {
            state: LockState::Unlocked,
            locked_at: None,
            hotkey_label: hotkey_label.into(),
            notifier,
            event_tx,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    /// Process signals until every sender has been dropped
    pub async fn run(&mut self, mut signal_rx: mpsc::UnboundedReceiver<bool>) {
        info!(state = %self.state, "lock controller started");

        while let Some(signal) = signal_rx.recv().await {
            self.handle_signal(signal);
        }

        info!("lock controller stopped");
    }

    /// Handle one queue signal; only `true` toggles the lock
    fn handle_signal(&mut self, signal: bool) {
        if !signal {
            debug!("ignoring false signal");
            return;
        }

        let next = match self.state {
            LockState::Unlocked => LockState::Locked,
            LockState::Locked => LockState::Unlocked,
        };
        self.transition_to(next);
    }

    fn transition_to(&mut self, new_state: LockState) {
        let event = match new_state {
            LockState::Locked => {
                self.locked_at = Some(Instant::now());
                LockEvent::Locked
            }
            LockState::Unlocked => {
                let duration_ms = self
                    .locked_at
                    .take()
                    .map(|t| t.elapsed().as_millis() as u64)
                    .unwrap_or(0);
                LockEvent::Unlocked { duration_ms }
            }
        };

        info!(from = %self.state, to = %new_state, "lock transition");
        self.state = new_state;

        self.notifier
            .send_in_thread(event.title(), &event.message(&self.hotkey_label));

        debug!(%event, "emitting lock event");
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
