pub mod plugin;
pub mod tracing;

use std::env;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Application environment, selects the log format
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development, // Pretty logs
    Production,  // JSON logs
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Non-empty, trimmed value of `key`
pub fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Resolve `primary`, falling back to `deprecated` names in order.
///
/// A value found under a deprecated name is returned with a warning naming
/// its replacement.
pub fn env_with_aliases(primary: &str, deprecated: &[&str]) -> Option<String> {
    if let Some(value) = env_non_empty(primary) {
        return Some(value);
    }

    deprecated.iter().find_map(|alias| {
        let value = env_non_empty(alias)?;
        ::tracing::warn!(
            deprecated = *alias,
            replacement = primary,
            "Using deprecated environment variable"
        );
        Some(value)
    })
}

/// Parse an optional variable, returning `default` when unset
pub fn env_parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_non_empty(key) {
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });

        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_with_aliases_prefers_primary() {
        temp_env::with_vars(
            [("NEW_NAME", Some("primary")), ("OLD_NAME", Some("deprecated"))],
            || {
                assert_eq!(
                    env_with_aliases("NEW_NAME", &["OLD_NAME"]).as_deref(),
                    Some("primary")
                );
            },
        );
    }

    #[test]
    fn test_env_with_aliases_falls_back_in_order() {
        temp_env::with_vars(
            [
                ("NEW_NAME", Some("  ")),
                ("OLD_NAME", None),
                ("OLDER_NAME", Some("older")),
            ],
            || {
                assert_eq!(
                    env_with_aliases("NEW_NAME", &["OLD_NAME", "OLDER_NAME"]).as_deref(),
                    Some("older")
                );
            },
        );
        temp_env::with_vars_unset(["NEW_NAME", "OLD_NAME"], || {
            assert_eq!(env_with_aliases("NEW_NAME", &["OLD_NAME"]), None);
        });
    }

    #[test]
    fn test_env_parse_or() {
        temp_env::with_var("PARSE_ME", Some("42"), || {
            assert_eq!(env_parse_or("PARSE_ME", 7usize).unwrap(), 42);
        });
        temp_env::with_var("PARSE_ME", Some("forty-two"), || {
            let err = env_parse_or("PARSE_ME", 7usize).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { key, .. } if key == "PARSE_ME"));
        });
        temp_env::with_var_unset("PARSE_ME", || {
            assert_eq!(env_parse_or("PARSE_ME", 7usize).unwrap(), 7);
        });
    }
}
