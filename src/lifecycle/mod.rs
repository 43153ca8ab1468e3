//! Process lifecycle: single-instance lock and shutdown signals

mod lockfile;
mod shutdown;

pub use lockfile::{InstanceLock, LockError};
pub use shutdown::ShutdownSignal;
