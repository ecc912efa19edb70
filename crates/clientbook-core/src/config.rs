// Configuration loading and parsing (config/clientbook.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE: &str = "clientbook.toml";
pub const DEFAULT_LOG_FILTER: &str = "clientbook=info,clientbook_core=info,warn";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file. Relative paths are resolved against the directory that
    /// holds `config/`.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// `clients.db` in the platform data directory (e.g.
/// `~/.local/share/clientbook` on Linux), or in the working directory when no
/// home directory can be determined.
pub fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "clientbook")
        .map(|dirs| dirs.data_dir().join("clients.db"))
        .unwrap_or_else(|| PathBuf::from("clients.db"))
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/clientbook.toml` relative to `base_dir`.
///
/// A missing file is not an error: built-in defaults are used instead.
/// This does not copy defaults; prefer `load_config()` for that.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);

    let mut config = if path.exists() {
        let text = read_file(&path)?;
        toml::from_str::<Config>(&text).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })?
    } else {
        Config::default()
    };

    if config.database.path.is_relative() && !config.database.path.as_os_str().is_empty() {
        config.database.path = base_dir.join(&config.database.path);
    }

    validate(&config)?;

    Ok(config)
}

/// Seed `config/clientbook.toml` from `defaults/clientbook.toml` when the
/// former is missing. Returns the path written, or `None` if there was
/// nothing to do. An existing config is never overwritten.
pub fn ensure_config_files(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let target = base_dir.join("config").join(CONFIG_FILE);

    if target.exists() || !source.is_file() {
        return Ok(None);
    }

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", dir.display()),
        })?;
    }
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;

    Ok(Some(target))
}

/// Seed the config from `defaults/` if needed and load the config found under
/// `base_dir`.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.database.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "database.path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.logging.filter.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.filter".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: a fresh scratch directory under the system temp dir.
    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("clientbook_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_config(base: &Path, text: &str) {
        let config_dir = base.join("config");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(CONFIG_FILE), text).unwrap();
    }

    #[test]
    fn load_valid_config() {
        let base = scratch_dir("valid");
        write_config(
            &base,
            r#"
            [database]
            path = "data/clients.db"

            [logging]
            filter = "debug"
            "#,
        );

        let config = load_config_from(&base).unwrap();
        assert_eq!(config.database.path, base.join("data/clients.db"));
        assert_eq!(config.logging.filter, "debug");

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn absolute_database_path_is_kept() {
        let base = scratch_dir("absolute");
        let db = std::env::temp_dir().join("elsewhere.db");
        write_config(
            &base,
            &format!("[database]\npath = {:?}\n", db.to_str().unwrap()),
        );

        let config = load_config_from(&base).unwrap();
        assert_eq!(config.database.path, db);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let base = scratch_dir("missing");
        let config = load_config_from(&base).unwrap();
        assert!(config.database.path.ends_with("clients.db"));
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let base = scratch_dir("invalid");
        write_config(&base, "[database\npath = ");

        let err = load_config_from(&base).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }), "unexpected: {err:?}");

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn rejects_empty_database_path() {
        let base = scratch_dir("empty_path");
        write_config(&base, "[database]\npath = \"\"\n");

        let err = load_config_from(&base).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "database.path"),
            other => panic!("unexpected: {other:?}"),
        }

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn rejects_blank_log_filter() {
        let base = scratch_dir("blank_filter");
        write_config(&base, "[logging]\nfilter = \"  \"\n");

        let err = load_config_from(&base).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "logging.filter"));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn ensure_config_files_seeds_from_defaults() {
        let base = scratch_dir("copy");
        let defaults = base.join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join(CONFIG_FILE), "[database]\npath = \"seeded.db\"\n").unwrap();

        let copied = ensure_config_files(&base).unwrap();
        assert_eq!(copied, Some(base.join("config").join(CONFIG_FILE)));

        let config = load_config_from(&base).unwrap();
        assert_eq!(config.database.path, base.join("seeded.db"));

        // Second run finds the seeded file and leaves it alone.
        assert_eq!(ensure_config_files(&base).unwrap(), None);

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let base = scratch_dir("skip");
        let defaults = base.join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join(CONFIG_FILE), "[database]\npath = \"seeded.db\"\n").unwrap();
        write_config(&base, "[database]\npath = \"mine.db\"\n");

        assert_eq!(ensure_config_files(&base).unwrap(), None);

        let config = load_config(&base).unwrap();
        assert_eq!(config.database.path, base.join("mine.db"));

        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn ensure_config_files_no_defaults_dir_is_ok() {
        let base = scratch_dir("no_defaults");
        assert_eq!(ensure_config_files(&base).unwrap(), None);
        assert!(!base.join("config").exists());
        let _ = fs::remove_dir_all(&base);
    }

    #[test]
    fn shipped_defaults_parse() {
        let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../defaults").join(CONFIG_FILE);
        let text = fs::read_to_string(&shipped).expect("defaults/clientbook.toml should exist");
        let config: Config = toml::from_str(&text).unwrap();
        assert_eq!(config.database.path, PathBuf::from("clients.db"));
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }
}
