//! `QUOTEGATE_*` environment overrides.
//!
//! Applied after all config files, so a variable always wins over a file.
//! A set but unparseable variable is an error rather than being ignored.

use std::str::FromStr;

use crate::{ConfigError, QuotegateConfig, Result};

pub const MAX_REQUESTS_ENV: &str = "QUOTEGATE_MAX_REQUESTS";
pub const TIME_WINDOW_ENV: &str = "QUOTEGATE_TIME_WINDOW";
pub const CACHE_TTL_ENV: &str = "QUOTEGATE_CACHE_TTL";
pub const CACHE_MAX_SIZE_ENV: &str = "QUOTEGATE_CACHE_MAX_SIZE";
pub const API_TIMEOUT_ENV: &str = "QUOTEGATE_API_TIMEOUT";
pub const MAX_RETRIES_ENV: &str = "QUOTEGATE_MAX_RETRIES";
pub const BACKOFF_FACTOR_ENV: &str = "QUOTEGATE_BACKOFF_FACTOR";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut QuotegateConfig) -> Result<()> {
    apply_env_overrides_from(config, |var| std::env::var(var).ok())
}

/// Apply overrides from an arbitrary variable lookup.
pub fn apply_env_overrides_from<F>(config: &mut QuotegateConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(value) = lookup(MAX_REQUESTS_ENV) {
        config.rate_limit.get_or_insert_with(Default::default).max_requests =
            parse(MAX_REQUESTS_ENV, &value)?;
    }
    if let Some(value) = lookup(TIME_WINDOW_ENV) {
        config
            .rate_limit
            .get_or_insert_with(Default::default)
            .time_window_secs = parse(TIME_WINDOW_ENV, &value)?;
    }

    if let Some(value) = lookup(CACHE_TTL_ENV) {
        config.cache.get_or_insert_with(Default::default).ttl_secs =
            parse(CACHE_TTL_ENV, &value)?;
    }
    if let Some(value) = lookup(CACHE_MAX_SIZE_ENV) {
        config.cache.get_or_insert_with(Default::default).max_size =
            parse(CACHE_MAX_SIZE_ENV, &value)?;
    }

    if let Some(value) = lookup(API_TIMEOUT_ENV) {
        config.api.get_or_insert_with(Default::default).timeout_secs =
            parse(API_TIMEOUT_ENV, &value)?;
    }
    if let Some(value) = lookup(MAX_RETRIES_ENV) {
        config.api.get_or_insert_with(Default::default).max_retries =
            parse(MAX_RETRIES_ENV, &value)?;
    }
    if let Some(value) = lookup(BACKOFF_FACTOR_ENV) {
        config.api.get_or_insert_with(Default::default).backoff_factor =
            parse(BACKOFF_FACTOR_ENV, &value)?;
    }

    Ok(())
}

fn parse<T: FromStr>(var: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_overrides_create_missing_sections() {
        let mut config = QuotegateConfig::new();
        apply_env_overrides_from(
            &mut config,
            lookup(&[
                (MAX_REQUESTS_ENV, "5"),
                (TIME_WINDOW_ENV, "10"),
                (CACHE_TTL_ENV, "60"),
                (API_TIMEOUT_ENV, " 15 "),
                (BACKOFF_FACTOR_ENV, "0.25"),
            ]),
        )
        .unwrap();

        let rate_limit = config.rate_limit();
        assert_eq!(rate_limit.max_requests, 5);
        assert_eq!(rate_limit.time_window_secs, 10);
        assert_eq!(config.cache().ttl_secs, 60);
        assert_eq!(config.api().timeout_secs, 15);
        assert_eq!(config.api().backoff_factor, 0.25);
    }

    #[test]
    fn test_overrides_keep_unrelated_file_values() {
        let mut config =
            QuotegateConfig::from_toml("[cache]\nttl_secs = 30\nmax_size = 4\n").unwrap();
        apply_env_overrides_from(&mut config, lookup(&[(CACHE_MAX_SIZE_ENV, "9")])).unwrap();

        let cache = config.cache();
        assert_eq!(cache.ttl_secs, 30);
        assert_eq!(cache.max_size, 9);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let mut config = QuotegateConfig::new();
        apply_env_overrides_from(&mut config, lookup(&[(MAX_RETRIES_ENV, "  ")])).unwrap();
        assert!(config.api.is_none());
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        let mut config = QuotegateConfig::new();
        let err = apply_env_overrides_from(&mut config, lookup(&[(MAX_REQUESTS_ENV, "thirty")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv { ref var, .. } if var == MAX_REQUESTS_ENV
        ));
    }
}
