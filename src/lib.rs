//! PawGate: keyboard lock toggled by a global hotkey
//!
//! - [`hotkey`]: registers the hotkey and turns presses into queue signals
//! - [`state`]: toggles the lock on each signal
//! - [`notify`]: best-effort toast notifications
//! - [`config`] and [`paths`]: `~/.pawgate/` layout and bundled resources
//! - [`lifecycle`]: single-instance lockfile and shutdown signals

pub mod config;
pub mod events;
pub mod hotkey;
pub mod lifecycle;
pub mod notify;
pub mod paths;
pub mod state;
