//! OS hotkey registration via the `global-hotkey` crate
//!
//! Windows and macOS only deliver hotkey events to the thread that created
//! the `GlobalHotKeyManager`, and only while that thread pumps its platform
//! event loop. The manager therefore lives inside a [`HotkeyPump`] that owns
//! one thread for its whole life; [`GlobalHotkeyBackend`] is the handle the
//! rest of the daemon uses, forwarding requests to the pump over a channel.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use global_hotkey::hotkey::HotKey;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tracing::{debug, error, info, trace};

use super::keys::parse_hotkey;
use super::listener::{HotkeyBackend, HotkeyCallback, HotkeyError, RegistrationId};

/// How long the pump waits for a request before servicing OS events
const PUMP_INTERVAL: Duration = Duration::from_millis(10);

/// How long a caller waits for the pump to answer
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

type Registry = Arc<Mutex<HashMap<u32, (HotKey, HotkeyCallback)>>>;
type Reply = mpsc::Sender<Result<(), HotkeyError>>;

/// Requests sent from the backend handle to the pump thread
enum Command {
    Register {
        label: String,
        hotkey: HotKey,
        callback: HotkeyCallback,
        reply: Reply,
    },
    Unregister {
        id: u32,
        reply: Reply,
    },
}

/// Handle registering hotkeys with the operating system
pub struct GlobalHotkeyBackend {
    cmd_tx: mpsc::Sender<Command>,
}

/// Owns the OS hotkey manager and its event loop
pub struct HotkeyPump {
    cmd_rx: mpsc::Receiver<Command>,
}

impl GlobalHotkeyBackend {
    /// Create a backend handle and the pump it talks to.
    ///
    /// The pump must be run with [`HotkeyPump::run`] on the thread that
    /// should own the OS manager (the main thread on macOS).
    pub fn channel() -> (Self, HotkeyPump) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        (Self { cmd_tx }, HotkeyPump { cmd_rx })
    }

    /// Create a backend whose pump runs on a dedicated thread
    pub fn spawn() -> Result<Self, HotkeyError> {
        let (backend, pump) = Self::channel();

        thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || pump.run())
            .map_err(|e| HotkeyError::Backend(format!("failed to spawn hotkey thread: {}", e)))?;

        Ok(backend)
    }

    fn request(&self, build: impl FnOnce(Reply) -> Command) -> Result<(), HotkeyError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(build(reply_tx))
            .map_err(|_| HotkeyError::Backend("hotkey thread has stopped".to_string()))?;

        reply_rx
            .recv_timeout(REPLY_TIMEOUT)
            .map_err(|_| HotkeyError::Backend("hotkey thread did not respond".to_string()))?
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    fn register(&self, hotkey: &str, callback: HotkeyCallback) -> Result<RegistrationId, HotkeyError> {
        let spec = parse_hotkey(hotkey)?;
        let os_hotkey = spec.to_hotkey();

        self.request(|reply| Command::Register {
            label: hotkey.to_string(),
            hotkey: os_hotkey,
            callback,
            reply,
        })?;

        debug!(%spec, id = os_hotkey.id(), "registered with OS");
        Ok(RegistrationId(os_hotkey.id()))
    }

    fn unregister(&self, id: RegistrationId) -> Result<(), HotkeyError> {
        self.request(|reply| Command::Unregister { id: id.0, reply })
    }
}

impl HotkeyPump {
    /// Create the OS manager on the calling thread and service it until
    /// every [`GlobalHotkeyBackend`] handle has been dropped
    pub fn run(self) {
        info!("hotkey pump started");

        let registry: Registry = Arc::default();
        let manager = match GlobalHotKeyManager::new() {
            Ok(manager) => {
                install_event_handler(Arc::clone(&registry));
                Some(manager)
            }
            Err(e) => {
                error!(%e, "failed to create OS hotkey manager");
                None
            }
        };

        loop {
            match self.cmd_rx.recv_timeout(PUMP_INTERVAL) {
                Ok(command) => handle_command(manager.as_ref(), &registry, command),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            platform::pump_events();
        }

        if manager.is_some() {
            GlobalHotKeyEvent::set_event_handler(None::<fn(GlobalHotKeyEvent)>);
        }
        info!("hotkey pump stopped");
    }
}

/// Route press events to the callback registered for the hotkey id
fn install_event_handler(registry: Registry) {
    GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
        if !matches!(event.state(), HotKeyState::Pressed) {
            return;
        }

        // Release the lock before running the callback
        let callback = registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.id())
            .map(|(_, callback)| Arc::clone(callback));

        match callback {
            Some(callback) => callback(),
            None => trace!(id = event.id(), "event for unregistered hotkey"),
        }
    }));
}

fn handle_command(manager: Option<&GlobalHotKeyManager>, registry: &Registry, command: Command) {
    let unavailable = || HotkeyError::Backend("OS hotkey manager unavailable".to_string());

    match command {
        Command::Register {
            label,
            hotkey,
            callback,
            reply,
        } => {
            let result = manager.ok_or_else(unavailable).and_then(|manager| {
                manager.register(hotkey).map_err(|e| match e {
                    global_hotkey::Error::AlreadyRegistered(_) => HotkeyError::AlreadyRegistered(label),
                    other => HotkeyError::Backend(other.to_string()),
                })
            });
            if result.is_ok() {
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(hotkey.id(), (hotkey, callback));
            }
            let _ = reply.send(result);
        }
        Command::Unregister { id, reply } => {
            let entry = registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&id);

            let result = match (entry, manager) {
                (None, _) => Err(HotkeyError::UnknownRegistration(RegistrationId(id))),
                (Some(_), None) => Err(unavailable()),
                (Some((hotkey, _)), Some(manager)) => manager
                    .unregister(hotkey)
                    .map_err(|e| HotkeyError::Backend(e.to_string())),
            };
            let _ = reply.send(result);
        }
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use windows::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
    };

    /// Drain the thread's Win32 message queue without blocking
    pub fn pump_events() {
        let mut msg = MSG::default();
        unsafe {
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use std::time::Duration;

    use core_foundation::runloop::{kCFRunLoopDefaultMode, CFRunLoop};

    /// Let the run loop dispatch any pending Carbon hotkey events
    pub fn pump_events() {
        unsafe {
            CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, Duration::ZERO, false);
        }
    }
}

// X11 delivers events from global-hotkey's own thread
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
mod platform {
    pub fn pump_events() {}
}
