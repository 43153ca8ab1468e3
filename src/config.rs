//! Configuration loading and management
//!
//! Settings live as pretty-printed JSON in `~/.pawgate/config.json`.
//! A missing file is seeded from the bundled default.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::paths::RuntimeEnv;

/// Hotkey used when none is configured or the configured one is rejected
pub const DEFAULT_HOTKEY: &str = "ctrl+b";

/// Bundled default configuration, relative to the resource root
pub const DEFAULT_CONFIG_RESOURCE: &str = "resources/config/config.json";

const DEFAULT_OVERLAY_RGB: (u8, u8, u8) = (27, 94, 32);

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hotkey that toggles the lock (e.g. "ctrl+b", "ctrl+shift+l")
    pub hotkey: String,

    /// Whether toast notifications are shown
    pub notifications_enabled: bool,

    /// Overlay opacity while locked (0.0 to 1.0)
    pub opacity: f32,

    /// Overlay color as `#RRGGBB`
    pub overlay_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hotkey: DEFAULT_HOTKEY.to_string(),
            notifications_enabled: true,
            opacity: 0.3,
            overlay_color: "#1B5E20".to_string(),
        }
    }
}

impl Config {
    /// Load the configuration at `path`, creating it if it doesn't exist
    pub fn load_or_init(path: &Path, env: &RuntimeEnv) -> Result<Self> {
        if !path.exists() {
            let config = Self::bundled_default(env);
            config.save(path)?;
            info!(path = %path.display(), "created default configuration");
            return Ok(config);
        }

        Self::load(path)
    }

    /// Read and parse the configuration at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Default shipped with the application, or the built-in default
    fn bundled_default(env: &RuntimeEnv) -> Self {
        let resource = env.packaged_path(DEFAULT_CONFIG_RESOURCE);
        if !resource.exists() {
            debug!(path = %resource.display(), "no bundled default configuration");
            return Self::default();
        }

        match Self::load(&resource) {
            Ok(config) => config,
            Err(e) => {
                warn!(?e, "ignoring unreadable bundled configuration");
                Self::default()
            }
        }
    }

    /// Overlay color as RGB, falling back to dark green if malformed
    pub fn overlay_rgb(&self) -> (u8, u8, u8) {
        let hex = self.overlay_color.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return DEFAULT_OVERLAY_RGB;
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        match (channel(0), channel(2), channel(4)) {
            (Ok(r), Ok(g), Ok(b)) => (r, g, b),
            _ => DEFAULT_OVERLAY_RGB,
        }
    }

    /// Opacity limited to the displayable range
    pub fn clamped_opacity(&self) -> f32 {
        if self.opacity.is_nan() {
            return Self::default().opacity;
        }
        self.opacity.clamp(0.0, 1.0)
    }
}
