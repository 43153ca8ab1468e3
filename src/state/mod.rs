//! State machine module for the keyboard lock
//!
//! Two states:
//! - Unlocked: default, keyboard input passes through
//! - Locked: toggled on by the hotkey, persists until toggled off

mod machine;

pub use machine::{LockController, LockState};
