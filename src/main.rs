//! pawgate: lock and unlock the keyboard with a global hotkey
//!
//! Runs in the background and provides:
//! - Global hotkey registration via `global-hotkey`
//! - A two-state lock machine toggled by the hotkey
//! - Toast notifications on every lock change
//! - JSON configuration in `~/.pawgate/config.json`
//! - Single-instance enforcement via `~/.pawgate/lockfile`

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pawgate::config::{Config, DEFAULT_HOTKEY};
use pawgate::events::LockEvent;
use pawgate::hotkey::{parse_hotkey, GlobalHotkeyBackend, HotkeyBackend, HotkeyError, HotkeyListener};
use pawgate::lifecycle::{InstanceLock, ShutdownSignal};
use pawgate::notify::{Notifier, NotifyRustBackend};
use pawgate::paths::{self, RuntimeEnv};
use pawgate::state::LockController;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "pawgate starting");

    launch()
}

/// Carbon hotkey events are dispatched by the main run loop, so the pump
/// takes the main thread and the daemon runs beside it
#[cfg(target_os = "macos")]
fn launch() -> Result<()> {
    let (backend, pump) = GlobalHotkeyBackend::channel();

    let daemon = std::thread::Builder::new()
        .name("pawgate-daemon".to_string())
        .spawn(move || run_daemon(Ok(backend)))
        .context("failed to spawn daemon thread")?;

    // Returns once the daemon drops its backend handle
    pump.run();

    daemon
        .join()
        .map_err(|_| anyhow::anyhow!("daemon thread panicked"))?
}

#[cfg(not(target_os = "macos"))]
fn launch() -> Result<()> {
    run_daemon(GlobalHotkeyBackend::spawn())
}

fn run_daemon(backend: Result<GlobalHotkeyBackend, HotkeyError>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(run(backend))
}

async fn run(backend: Result<GlobalHotkeyBackend, HotkeyError>) -> Result<()> {
    let env = RuntimeEnv::detect();

    // No home directory means no config and no lockfile: fatal
    let lockfile_path = paths::lockfile_path()?;
    let config_path = paths::get_config_path()?;

    let _instance = InstanceLock::acquire(&lockfile_path)
        .context("pawgate is already running or the lockfile is unusable")?;

    let config = Config::load_or_init(&config_path, &env)?;
    info!(
        path = %config_path.display(),
        hotkey = %config.hotkey,
        packaged = env.is_packaged(),
        "configuration loaded"
    );

    let notifier = Notifier::new(Arc::new(NotifyRustBackend), config.notifications_enabled);

    // Hotkey listener -> lock controller. Main keeps a sender so the
    // controller outlives a failed hotkey registration.
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    // Lock controller -> anyone watching lock changes
    let (event_tx, mut event_rx) = broadcast::channel::<LockEvent>(16);

    let mut listener = match backend {
        Ok(backend) => start_listener(Arc::new(backend), signal_tx.clone(), &config.hotkey),
        Err(e) => {
            error!(?e, "failed to start hotkey backend");
            warn!("continuing without hotkey support");
            None
        }
    };

    let hotkey_label = listener
        .as_ref()
        .and_then(|l| parse_hotkey(l.hotkey()).ok())
        .map(|spec| spec.to_string())
        .unwrap_or_else(|| config.hotkey.clone());

    let mut controller = LockController::new(notifier, event_tx, hotkey_label);
    let shutdown = ShutdownSignal::new();

    info!("pawgate initialized, entering main loop");

    tokio::select! {
        _ = controller.run(signal_rx) => {
            info!("lock controller exited");
        }

        _ = async {
            loop {
                match event_rx.recv().await {
                    Ok(event) => info!(%event, "lock event"),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "lock event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        } => {
            info!("lock event handler exited");
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");

    if let Some(listener) = listener.as_mut() {
        listener.stop();
    }
    drop(signal_tx);

    info!("pawgate stopped");

    Ok(())
}

/// Register the configured hotkey, falling back to the default if rejected
fn start_listener(
    backend: Arc<dyn HotkeyBackend>,
    signal_tx: mpsc::UnboundedSender<bool>,
    hotkey: &str,
) -> Option<HotkeyListener> {
    match HotkeyListener::new(Arc::clone(&backend), signal_tx.clone(), hotkey) {
        Ok(listener) => return Some(listener),
        Err(e @ HotkeyError::InvalidHotkey { .. }) if hotkey != DEFAULT_HOTKEY => {
            warn!(%e, fallback = DEFAULT_HOTKEY, "configured hotkey rejected");
        }
        Err(e) => {
            error!(%e, "failed to register hotkey");
            return None;
        }
    }

    match HotkeyListener::new(backend, signal_tx, DEFAULT_HOTKEY) {
        Ok(listener) => Some(listener),
        Err(e) => {
            error!(%e, "failed to register default hotkey");
            None
        }
    }
}
