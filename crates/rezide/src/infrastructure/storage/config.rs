//! Locating and decoding the layout file.
//!
//! The first existing file wins, searched in this order:
//!
//! 1. the file given with `--config` / `REZIDE_CONFIG` (it must exist);
//! 2. `$XDG_CONFIG_HOME/rezide/config.toml`;
//! 3. `$HOME/.config/rezide/config.toml`;
//! 4. `$HOME/.rezide.toml`.
//!
//! # File format (for beginners)
//!
//! Every top-level table of the TOML file is one named layout entry.  A
//! window names the command to run and the mark to put on its window:
//!
//! ```toml
//! [editor]
//! command = "alacritty -e nvim"
//! mark = "editor"
//! ```
//!
//! A section splits its space among other entries, referenced by name:
//!
//! ```toml
//! [coding]
//! split = "horizontal"
//! children = ["editor", "terminal"]
//! sizes = [70, 30]
//! is_layout = true
//! ```
//!
//! Decoding is deliberately loose: any TOML value is accepted into a
//! `RawValue`, and the validator in `rezide_core` reports entries of the
//! wrong shape by name.

use std::path::{Path, PathBuf};

use rezide_core::LayoutSet;
use thiserror::Error;
use tracing::debug;

/// Directory below `$XDG_CONFIG_HOME` (or `~/.config`) holding the file.
pub const APP_DIR_NAME: &str = "rezide";
/// File name inside [`APP_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Fallback file directly in the home directory.
pub const HOME_FILE_NAME: &str = ".rezide.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("config file {} does not exist", .0.display())]
    Missing(PathBuf),

    /// None of the default locations holds a file.
    #[error("no config file found; searched {}", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Locating the file ─────────────────────────────────────────────────────────

/// Inputs to config file resolution.
///
/// Usually filled from CLI flags, which fall back to the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLocations {
    /// Explicit file; when set, no other location is consulted.
    pub explicit: Option<PathBuf>,
    /// Value of `XDG_CONFIG_HOME`.
    pub xdg_config_home: Option<PathBuf>,
    /// Value of `HOME`.
    pub home: Option<PathBuf>,
}

impl ConfigLocations {
    /// Reads `REZIDE_CONFIG`, `XDG_CONFIG_HOME`, and `HOME` from the
    /// environment.
    pub fn from_env() -> Self {
        Self {
            explicit: env_path("REZIDE_CONFIG"),
            xdg_config_home: env_path("XDG_CONFIG_HOME"),
            home: env_path("HOME"),
        }
    }

    /// Returns the default locations in search order, ignoring `explicit`.
    ///
    /// Empty and relative `XDG_CONFIG_HOME` values are ignored, as the XDG
    /// base directory rules require.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if let Some(xdg) = usable(&self.xdg_config_home).filter(|p| p.is_absolute()) {
            out.push(xdg.join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
        }
        if let Some(home) = usable(&self.home) {
            out.push(home.join(".config").join(APP_DIR_NAME).join(CONFIG_FILE_NAME));
            out.push(home.join(HOME_FILE_NAME));
        }
        out
    }

    /// Returns the path of the file to read.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] if `explicit` is set but does not exist.
    /// - [`ConfigError::NotFound`] if no default location holds a file.
    pub fn resolve(&self) -> Result<PathBuf, ConfigError> {
        if let Some(explicit) = usable(&self.explicit) {
            if explicit.is_file() {
                return Ok(explicit.to_path_buf());
            }
            return Err(ConfigError::Missing(explicit.to_path_buf()));
        }

        let searched = self.candidates();
        for candidate in &searched {
            debug!("looking for config at {}", candidate.display());
            if candidate.is_file() {
                return Ok(candidate.clone());
            }
        }
        Err(ConfigError::NotFound { searched })
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key).map(PathBuf::from)
}

fn usable(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

// ── Reading the file ──────────────────────────────────────────────────────────

/// Source of raw layout definitions.
pub trait ConfigSource {
    /// Reads and decodes the full layout set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the source cannot be read or decoded.
    fn read(&self) -> Result<LayoutSet, ConfigError>;
}

/// A TOML layout file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TomlConfigFile {
    path: PathBuf,
}

impl TomlConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves `locations` and wraps the file found.
    ///
    /// # Errors
    ///
    /// See [`ConfigLocations::resolve`].
    pub fn locate(locations: &ConfigLocations) -> Result<Self, ConfigError> {
        locations.resolve().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for TomlConfigFile {
    fn read(&self) -> Result<LayoutSet, ConfigError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        let set = parse_layout_set(&content, &self.path)?;
        debug!("read {} entries from {}", set.len(), self.path.display());
        Ok(set)
    }
}

/// Decodes TOML text into a [`LayoutSet`].  `path` is used for error messages.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if `text` is not valid TOML.
pub fn parse_layout_set(text: &str, path: &Path) -> Result<LayoutSet, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rezide_core::RawValue;
    use uuid::Uuid;

    /// Creates a fresh, empty directory under the system temp dir.
    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rezide-config-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write file");
    }

    const WINDOW: &str = "[solo]\ncommand = \"alacritty\"\nmark = \"solo\"\n";

    // ── candidates ────────────────────────────────────────────────────────────

    #[test]
    fn test_candidates_are_in_search_order() {
        // Arrange
        let locations = ConfigLocations {
            explicit: None,
            xdg_config_home: Some(PathBuf::from("/xdg")),
            home: Some(PathBuf::from("/home/me")),
        };

        // Act
        let candidates = locations.candidates();

        // Assert
        assert_eq!(
            candidates,
            [
                PathBuf::from("/xdg/rezide/config.toml"),
                PathBuf::from("/home/me/.config/rezide/config.toml"),
                PathBuf::from("/home/me/.rezide.toml"),
            ]
        );
    }

    #[test]
    fn test_candidates_ignore_empty_and_relative_xdg() {
        let empty = ConfigLocations {
            xdg_config_home: Some(PathBuf::new()),
            home: Some(PathBuf::from("/home/me")),
            ..Default::default()
        };
        let relative = ConfigLocations {
            xdg_config_home: Some(PathBuf::from("relative/dir")),
            ..Default::default()
        };

        assert_eq!(empty.candidates().len(), 2);
        assert!(relative.candidates().is_empty());
    }

    // ── resolve ───────────────────────────────────────────────────────────────

    #[test]
    fn test_resolve_prefers_xdg_over_home() {
        // Arrange
        let root = scratch_dir();
        let xdg_file = root.join("xdg").join("rezide").join("config.toml");
        let home_file = root.join("home").join(".rezide.toml");
        write(&xdg_file, WINDOW);
        write(&home_file, WINDOW);
        let locations = ConfigLocations {
            explicit: None,
            xdg_config_home: Some(root.join("xdg")),
            home: Some(root.join("home")),
        };

        // Act
        let resolved = locations.resolve().unwrap();

        // Assert
        assert_eq!(resolved, xdg_file);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_resolve_falls_back_to_home_dotfile() {
        let root = scratch_dir();
        let home_file = root.join(".rezide.toml");
        write(&home_file, WINDOW);
        let locations = ConfigLocations {
            home: Some(root.clone()),
            ..Default::default()
        };

        assert_eq!(locations.resolve().unwrap(), home_file);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_resolve_missing_explicit_file_does_not_fall_back() {
        // Arrange: a home dotfile exists, but the explicit path wins
        let root = scratch_dir();
        write(&root.join(".rezide.toml"), WINDOW);
        let explicit = root.join("nope.toml");
        let locations = ConfigLocations {
            explicit: Some(explicit.clone()),
            xdg_config_home: None,
            home: Some(root.clone()),
        };

        // Act
        let err = locations.resolve().unwrap_err();

        // Assert
        assert!(matches!(err, ConfigError::Missing(ref p) if *p == explicit));
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_resolve_nothing_found_lists_every_candidate() {
        let root = scratch_dir();
        let locations = ConfigLocations {
            explicit: None,
            xdg_config_home: Some(root.join("xdg")),
            home: Some(root.join("home")),
        };

        let err = locations.resolve().unwrap_err();

        match err {
            ConfigError::NotFound { searched } => assert_eq!(searched.len(), 3),
            other => panic!("expected NotFound, got {other:?}"),
        }
        let _ = std::fs::remove_dir_all(root);
    }

    // ── read ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_toml_config_file_reads_entries() {
        // Arrange
        let root = scratch_dir();
        let path = root.join("config.toml");
        write(&path, WINDOW);

        // Act
        let set = TomlConfigFile::new(&path).read().unwrap();

        // Assert
        assert_eq!(set.len(), 1);
        assert!(matches!(set.get("solo"), Some(RawValue::Table(_))));
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_toml_config_file_unreadable_path_is_io_error() {
        let path = std::env::temp_dir().join(format!("rezide-absent-{}.toml", Uuid::new_v4()));

        let err = TomlConfigFile::new(&path).read().unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_layout_set_rejects_invalid_toml() {
        let err = parse_layout_set("[broken\n", Path::new("inline.toml")).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == Path::new("inline.toml")));
        assert!(err.to_string().contains("inline.toml"));
    }

    #[test]
    fn test_parse_layout_set_keeps_non_table_values_for_the_validator() {
        let set = parse_layout_set("stray = 3\n", Path::new("inline.toml")).unwrap();

        assert_eq!(set.get("stray"), Some(&RawValue::Integer(3)));
    }
}
