//! Filesystem locations for bundled resources and per-user state
//!
//! Resources resolve against the source tree during development and
//! against the extraction directory when running from a packaged bundle.
//! User state lives under `~/.pawgate/`.

use std::path::{Path, PathBuf};

/// Hidden per-user application directory, relative to home
pub const APP_DIR_NAME: &str = ".pawgate";

/// User configuration file inside [`APP_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Single-instance marker file inside [`APP_DIR_NAME`]
pub const LOCKFILE_NAME: &str = "lockfile";

/// Environment variable set by the packaging launcher to the bundle's
/// extraction directory
pub const BUNDLE_DIR_VAR: &str = "PAWGATE_BUNDLE_DIR";

/// Errors resolving user paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("could not determine the user's home directory")]
    NoHomeDir,
}

/// Where the process is running from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnv {
    /// Extraction directory of the bundle, if packaged
    bundle_dir: Option<PathBuf>,
    /// Project root used for resources when unpackaged
    source_root: PathBuf,
}

impl RuntimeEnv {
    /// Inspect the current process environment.
    ///
    /// Reads the bundle marker on every call, so a launcher that sets or
    /// clears it is always observed.
    pub fn detect() -> Self {
        let bundle_dir = std::env::var_os(BUNDLE_DIR_VAR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Self {
            bundle_dir,
            source_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")),
        }
    }

    /// Unpackaged environment rooted at `source_root`
    pub fn development(source_root: impl Into<PathBuf>) -> Self {
        Self {
            bundle_dir: None,
            source_root: source_root.into(),
        }
    }

    /// Packaged environment extracted to `bundle_dir`
    pub fn packaged(bundle_dir: impl Into<PathBuf>, source_root: impl Into<PathBuf>) -> Self {
        Self {
            bundle_dir: Some(bundle_dir.into()),
            source_root: source_root.into(),
        }
    }

    /// Whether a bundle extraction directory is active
    pub fn is_packaged(&self) -> bool {
        self.bundle_dir.is_some()
    }

    /// Directory resource paths are resolved against
    pub fn resource_root(&self) -> &Path {
        self.bundle_dir.as_deref().unwrap_or(self.source_root.as_path())
    }

    /// Resolve a resource path relative to the active resource root
    pub fn packaged_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.resource_root().join(relative)
    }
}

/// Resolve a bundled resource for the current process
pub fn get_packaged_path(relative: impl AsRef<Path>) -> PathBuf {
    RuntimeEnv::detect().packaged_path(relative)
}

/// The current user's home directory
pub fn home_dir() -> Result<PathBuf, PathError> {
    dirs::home_dir().ok_or(PathError::NoHomeDir)
}

/// `<home>/.pawgate`
pub fn app_dir_in(home: &Path) -> PathBuf {
    home.join(APP_DIR_NAME)
}

/// `<home>/.pawgate/config.json`
pub fn config_path_in(home: &Path) -> PathBuf {
    app_dir_in(home).join(CONFIG_FILE_NAME)
}

/// `<home>/.pawgate/lockfile`
pub fn lockfile_path_in(home: &Path) -> PathBuf {
    app_dir_in(home).join(LOCKFILE_NAME)
}

/// User configuration file for the current user
pub fn get_config_path() -> Result<PathBuf, PathError> {
    Ok(config_path_in(&home_dir()?))
}

/// Lockfile for the current user
pub fn lockfile_path() -> Result<PathBuf, PathError> {
    Ok(lockfile_path_in(&home_dir()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_path_is_source_relative() {
        let env = RuntimeEnv::development("/src/pawgate");
        let path = env.packaged_path("resources/config/config.json");

        assert!(!env.is_packaged());
        assert_eq!(path, Path::new("/src/pawgate/resources/config/config.json"));

        let text = path.to_string_lossy();
        assert!(text.contains("resources"));
        assert!(text.contains("config.json"));
    }

    #[test]
    fn test_packaged_path_uses_bundle_dir() {
        let env = RuntimeEnv::packaged("/tmp/fake_bundle_12345", "/src/pawgate");
        let path = env.packaged_path("resources/img/icon.ico");

        assert!(env.is_packaged());
        assert!(path.starts_with("/tmp/fake_bundle_12345"));
        assert!(!path.starts_with("/src/pawgate"));
        assert!(path.ends_with("resources/img/icon.ico"));
    }

    #[test]
    fn test_special_characters_are_preserved() {
        let env = RuntimeEnv::development("/home/user/My Projects/pawgate");
        let path = env.packaged_path("resources/imágenes/ícono final.ico");

        let text = path.to_string_lossy();
        assert!(text.contains("My Projects"));
        assert!(text.ends_with("ícono final.ico"));
    }

    // The only test touching the bundle marker, so it can't race another
    #[test]
    fn test_get_packaged_path_follows_bundle_marker() {
        let previous = std::env::var_os(BUNDLE_DIR_VAR);
        let relative = "resources/config/config.json";

        std::env::set_var(BUNDLE_DIR_VAR, "/tmp/fake_bundle_12345");
        let packaged = get_packaged_path(relative);

        std::env::remove_var(BUNDLE_DIR_VAR);
        let unpackaged = get_packaged_path(relative);

        std::env::set_var(BUNDLE_DIR_VAR, "");
        let empty_marker = get_packaged_path(relative);

        match previous {
            Some(value) => std::env::set_var(BUNDLE_DIR_VAR, value),
            None => std::env::remove_var(BUNDLE_DIR_VAR),
        }

        assert_eq!(packaged, Path::new("/tmp/fake_bundle_12345").join(relative));

        let text = unpackaged.to_string_lossy();
        assert!(text.contains("resources"));
        assert!(text.contains("config.json"));
        assert!(unpackaged.starts_with(env!("CARGO_MANIFEST_DIR")));

        assert_eq!(empty_marker, unpackaged);
    }

    #[test]
    fn test_config_path_layout() {
        let home = dirs::home_dir().unwrap();
        let path = get_config_path().unwrap();
        let text = path.to_string_lossy();

        assert!(path.starts_with(&home));
        assert!(text.contains(".pawgate"));
        assert!(text.ends_with(".json"));
    }

    #[test]
    fn test_lockfile_path_layout() {
        let path = lockfile_path().unwrap();
        let text = path.to_string_lossy();

        assert!(text.contains(".pawgate"));
        assert!(text.to_lowercase().contains("lockfile"));
        assert_eq!(path.parent(), get_config_path().unwrap().parent());
    }

    #[test]
    fn test_paths_in_explicit_home() {
        let home = Path::new("/home/alice");
        assert_eq!(config_path_in(home), Path::new("/home/alice/.pawgate/config.json"));
        assert_eq!(lockfile_path_in(home), Path::new("/home/alice/.pawgate/lockfile"));
    }
}
