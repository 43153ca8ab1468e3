//! Hotkey module for the global lock/unlock shortcut
//!
//! Registers one system-wide hotkey through the `global-hotkey` crate and
//! forwards each press to the lock state machine as a queue signal.

mod backend;
mod keys;
mod listener;

pub use backend::{GlobalHotkeyBackend, HotkeyPump};
pub use keys::{parse_hotkey, HotkeySpec, ModifierState};
pub use listener::{HotkeyBackend, HotkeyCallback, HotkeyError, HotkeyListener, RegistrationId};
