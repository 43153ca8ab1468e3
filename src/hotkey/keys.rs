//! Hotkey string parsing
//!
//! Turns user-facing strings such as `ctrl+shift+l` into the modifier set
//! and key code understood by the OS registration layer.

use std::fmt;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};

use super::listener::HotkeyError;

const LETTERS: [Code; 26] = [
    Code::KeyA, Code::KeyB, Code::KeyC, Code::KeyD, Code::KeyE, Code::KeyF,
    Code::KeyG, Code::KeyH, Code::KeyI, Code::KeyJ, Code::KeyK, Code::KeyL,
    Code::KeyM, Code::KeyN, Code::KeyO, Code::KeyP, Code::KeyQ, Code::KeyR,
    Code::KeyS, Code::KeyT, Code::KeyU, Code::KeyV, Code::KeyW, Code::KeyX,
    Code::KeyY, Code::KeyZ,
];

const DIGITS: [Code; 10] = [
    Code::Digit0, Code::Digit1, Code::Digit2, Code::Digit3, Code::Digit4,
    Code::Digit5, Code::Digit6, Code::Digit7, Code::Digit8, Code::Digit9,
];

const FUNCTION_KEYS: [Code; 24] = [
    Code::F1, Code::F2, Code::F3, Code::F4, Code::F5, Code::F6,
    Code::F7, Code::F8, Code::F9, Code::F10, Code::F11, Code::F12,
    Code::F13, Code::F14, Code::F15, Code::F16, Code::F17, Code::F18,
    Code::F19, Code::F20, Code::F21, Code::F22, Code::F23, Code::F24,
];

/// Tracks which modifier keys are part of a hotkey
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    /// Windows / Super / Command key
    pub win: bool,
}

impl ModifierState {
    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.win
    }

    /// Convert to the registration layer's modifier flags
    pub fn to_modifiers(self) -> Modifiers {
        let mut mods = Modifiers::empty();
        if self.ctrl {
            mods |= Modifiers::CONTROL;
        }
        if self.alt {
            mods |= Modifiers::ALT;
        }
        if self.shift {
            mods |= Modifiers::SHIFT;
        }
        if self.win {
            mods |= Modifiers::SUPER;
        }
        mods
    }

    /// Set the flag named by `token`, returning false if it isn't a modifier
    fn apply(&mut self, token: &str) -> bool {
        match token {
            "ctrl" | "control" => self.ctrl = true,
            "alt" | "option" => self.alt = true,
            "shift" => self.shift = true,
            "win" | "windows" | "super" | "cmd" | "command" => self.win = true,
            _ => return false,
        }
        true
    }
}

/// A parsed hotkey: modifiers plus exactly one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeySpec {
    pub modifiers: ModifierState,
    pub code: Code,
    /// Display label of the key, e.g. "B" or "F12"
    label: String,
}

impl HotkeySpec {
    /// Build the registration value for this hotkey
    pub fn to_hotkey(&self) -> HotKey {
        let mods = self.modifiers.to_modifiers();
        HotKey::new((!mods.is_empty()).then_some(mods), self.code)
    }
}

impl fmt::Display for HotkeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        for (held, name) in [(m.ctrl, "Ctrl"), (m.alt, "Alt"), (m.shift, "Shift"), (m.win, "Win")] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.label)
    }
}

impl std::str::FromStr for HotkeySpec {
    type Err = HotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hotkey(s)
    }
}

/// Parse a `+`-separated hotkey string such as `ctrl+alt+f12`
pub fn parse_hotkey(spec: &str) -> Result<HotkeySpec, HotkeyError> {
    let invalid = |reason: &str| HotkeyError::InvalidHotkey {
        hotkey: spec.to_string(),
        reason: reason.to_string(),
    };

    if spec.trim().is_empty() {
        return Err(invalid("empty hotkey"));
    }

    let mut modifiers = ModifierState::default();
    let mut key: Option<(Code, String)> = None;

    for token in spec.split('+').map(|t| t.trim().to_ascii_lowercase()) {
        if token.is_empty() {
            return Err(invalid("empty key name"));
        }
        if modifiers.apply(&token) {
            continue;
        }

        let parsed = parse_key(&token).ok_or_else(|| invalid(&format!("unknown key '{}'", token)))?;
        if key.replace(parsed).is_some() {
            return Err(invalid("more than one non-modifier key"));
        }
    }

    let (code, label) = key.ok_or_else(|| invalid("no key besides modifiers"))?;
    Ok(HotkeySpec {
        modifiers,
        code,
        label,
    })
}

/// Map a lowercase key token to its code and display label
fn parse_key(token: &str) -> Option<(Code, String)> {
    if token.len() == 1 {
        let c = char::from(token.as_bytes()[0]);
        let code = match c {
            'a'..='z' => LETTERS[(c as u8 - b'a') as usize],
            '0'..='9' => DIGITS[(c as u8 - b'0') as usize],
            _ => return None,
        };
        return Some((code, c.to_ascii_uppercase().to_string()));
    }

    if let Some(n) = token.strip_prefix('f').and_then(|n| n.parse::<usize>().ok()) {
        if (1..=FUNCTION_KEYS.len()).contains(&n) {
            return Some((FUNCTION_KEYS[n - 1], format!("F{}", n)));
        }
        return None;
    }

    let (code, label) = match token {
        "space" => (Code::Space, "Space"),
        "enter" | "return" => (Code::Enter, "Enter"),
        "escape" | "esc" => (Code::Escape, "Esc"),
        "tab" => (Code::Tab, "Tab"),
        "backspace" => (Code::Backspace, "Backspace"),
        "delete" | "del" => (Code::Delete, "Delete"),
        "insert" | "ins" => (Code::Insert, "Insert"),
        "home" => (Code::Home, "Home"),
        "end" => (Code::End, "End"),
        "pageup" | "pgup" => (Code::PageUp, "PageUp"),
        "pagedown" | "pgdn" => (Code::PageDown, "PageDown"),
        "up" => (Code::ArrowUp, "Up"),
        "down" => (Code::ArrowDown, "Down"),
        "left" => (Code::ArrowLeft, "Left"),
        "right" => (Code::ArrowRight, "Right"),
        "numlock" => (Code::NumLock, "NumLock"),
        "scrolllock" => (Code::ScrollLock, "ScrollLock"),
        "pause" => (Code::Pause, "Pause"),
        "printscreen" | "prtsc" => (Code::PrintScreen, "PrintScreen"),
        _ => return None,
    };
    Some((code, label.to_string()))
}
