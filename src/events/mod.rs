//! Events emitted when the keyboard lock changes state
//!
//! Each event also knows the toast it should produce.

use serde::{Deserialize, Serialize};

/// Events emitted by the lock controller during transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LockEvent {
    /// Keyboard input is now blocked
    Locked,

    /// Keyboard input is usable again
    Unlocked {
        /// How long the keyboard stayed locked, in milliseconds
        duration_ms: u64,
    },
}

impl LockEvent {
    /// Toast title for this event
    pub fn title(&self) -> &'static str {
        match self {
            LockEvent::Locked => "Keyboard Locked",
            LockEvent::Unlocked { .. } => "Keyboard Unlocked",
        }
    }

    /// Toast body for this event; `hotkey` is the display form of the toggle
    pub fn message(&self, hotkey: &str) -> String {
        match self {
            LockEvent::Locked => format!("Press {} to unlock", hotkey),
            LockEvent::Unlocked { .. } => "Your keyboard is ready to use".to_string(),
        }
    }
}

impl std::fmt::Display for LockEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockEvent::Locked => write!(f, "KEYBOARD_LOCKED"),
            LockEvent::Unlocked { duration_ms } => {
                write!(f, "KEYBOARD_UNLOCKED ({}ms)", duration_ms)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = LockEvent::Unlocked { duration_ms: 1500 };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("unlocked"));
        assert!(json.contains("1500"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"locked"}"#;
        let event: LockEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, LockEvent::Locked);
    }

    #[test]
    fn test_lock_message_mentions_hotkey() {
        let event = LockEvent::Locked;
        assert!(event.title().to_lowercase().contains("locked"));
        assert_eq!(event.message("Ctrl+B"), "Press Ctrl+B to unlock");
    }

    #[test]
    fn test_unlock_message_confirms_usable() {
        let event = LockEvent::Unlocked { duration_ms: 0 };
        assert_eq!(event.title(), "Keyboard Unlocked");
        assert!(event.message("Ctrl+B").contains("ready"));
        assert_eq!(event.to_string(), "KEYBOARD_UNLOCKED (0ms)");
    }
}
