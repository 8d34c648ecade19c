//! Configuration system for quotegate.
//!
//! Provides TOML-based configuration with:
//! - `[rate_limit]`, `[cache]` and `[api]` sections
//! - Config file layering (user config dir + project-local overrides)
//! - `QUOTEGATE_*` environment overrides applied last
//!
//! Sections implement the capability traits from `quotegate-types`, so the
//! rate limiter and cache can be built straight from a loaded config.

pub mod discovery;
pub mod env;
pub mod error;
pub mod types;

pub use discovery::{
    LoadedConfig, load_config, load_config_file, load_config_with_options, xdg_config_dir,
    xdg_config_path,
};
pub use env::{apply_env_overrides, apply_env_overrides_from};
pub use error::{ConfigError, Result};
pub use types::*;
