//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/quotegate/config.toml` (user config)
//! 2. `./quotegate.toml` (project-local)
//! 3. `QUOTEGATE_*` environment variables

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::env::apply_env_overrides;
use crate::{ConfigError, QuotegateConfig, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "quotegate.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "quotegate";

/// Environment variable to override the user config directory.
const CONFIG_DIR_ENV: &str = "QUOTEGATE_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: QuotegateConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (unreadable or malformed layers).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `QUOTEGATE_CONFIG_DIR` and the platform default.
/// The merged result is validated after environment overrides are applied.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = QuotegateConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    // 1. User config: explicit override, then env var, then platform default
    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    // 2. Project-local config
    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    // 3. Environment
    apply_env_overrides(&mut config)?;
    config.validate()?;

    for warning in &warnings {
        warn!("{}", warning);
    }

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery, no env overrides).
pub fn load_config_file(path: &Path) -> Result<QuotegateConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    QuotegateConfig::from_toml(&contents)
}

/// Get the user config file path for quotegate.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the user config directory for quotegate.
///
/// Checks `QUOTEGATE_CONFIG_DIR` first, then falls back to the platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a config file and merge it into the existing config.
///
/// A missing file is skipped silently; an unreadable or malformed one is
/// skipped with a warning.
fn load_layer(config: &mut QuotegateConfig, path: &Path, warnings: &mut Vec<String>) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            debug!(path = %path.display(), "Loaded config layer");
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_xdg_config_path_shape() {
        if let Some(p) = xdg_config_path() {
            assert!(p.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[rate_limit]\nmax_requests = 12\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.rate_limit().max_requests, 12);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_project_only() {
        let project_dir = TempDir::new().unwrap();
        let empty_config_dir = TempDir::new().unwrap();
        fs::write(
            project_dir.path().join("quotegate.toml"),
            r#"
[cache]
ttl_secs = 300
max_size = 50
"#,
        )
        .unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(empty_config_dir.path()))
                .unwrap();

        assert_eq!(loaded.config.cache().ttl_secs, 300);
        assert_eq!(loaded.config.cache().max_size, 50);
        assert_eq!(loaded.loaded_from().len(), 1);
    }

    #[test]
    fn test_load_config_no_files() {
        let project_dir = TempDir::new().unwrap();
        let empty_config_dir = TempDir::new().unwrap();
        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(empty_config_dir.path()))
                .unwrap();
        assert!(loaded.config.cache.is_none());
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_layered_merge() {
        let user_dir = TempDir::new().unwrap();
        let project_dir = TempDir::new().unwrap();

        let user_config = user_dir.path().join("config.toml");
        fs::write(
            &user_config,
            r#"
[rate_limit]
max_requests = 30
time_window_secs = 60

[cache]
max_size = 10
"#,
        )
        .unwrap();

        let project_config = project_dir.path().join("quotegate.toml");
        fs::write(
            &project_config,
            r#"
[rate_limit]
max_requests = 5
time_window_secs = 10
"#,
        )
        .unwrap();

        let mut config = QuotegateConfig::new();
        let mut warnings = Vec::new();
        load_layer(&mut config, &user_config, &mut warnings);
        load_layer(&mut config, &project_config, &mut warnings);

        // Project-local overrides the user layer section by section
        assert_eq!(config.rate_limit().max_requests, 5);
        assert_eq!(config.rate_limit().time_window_secs, 10);
        assert_eq!(config.cache().max_size, 10);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_malformed_layer_is_skipped_with_warning() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotegate.toml");
        fs::write(&path, "[cache\nmax_size = ").unwrap();

        let mut config = QuotegateConfig::new();
        let mut warnings = Vec::new();
        let source = load_layer(&mut config, &path, &mut warnings);

        assert!(!source.loaded);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Failed to load"));
    }

    #[test]
    fn test_malformed_project_file_is_reported() {
        let project_dir = TempDir::new().unwrap();
        let empty_config_dir = TempDir::new().unwrap();
        fs::write(project_dir.path().join("quotegate.toml"), "[cache
").unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(empty_config_dir.path()))
                .unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_invalid_values_fail_loading() {
        let project_dir = TempDir::new().unwrap();
        let empty_config_dir = TempDir::new().unwrap();
        fs::write(
            project_dir.path().join("quotegate.toml"),
            "[cache]\nmax_size = 0\n",
        )
        .unwrap();

        let err =
            load_config_with_options(Some(project_dir.path()), Some(empty_config_dir.path()))
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
