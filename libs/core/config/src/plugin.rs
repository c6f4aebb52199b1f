use crate::{ConfigError, FromEnv, env_non_empty, env_parse_or, env_with_aliases};
use std::path::PathBuf;

pub const REGION_VAR: &str = "COST_PLUGIN_REGION";
pub const DEPRECATED_REGION_VAR: &str = "PULUMICOST_PLUGIN_REGION";
pub const LEGACY_REGION_VAR: &str = "AWS_REGION";
pub const MAX_BATCH_SIZE_VAR: &str = "COST_PLUGIN_MAX_BATCH_SIZE";
pub const STRICT_VALIDATION_VAR: &str = "COST_PLUGIN_STRICT_VALIDATION";
pub const PRICING_FILE_VAR: &str = "COST_PLUGIN_PRICING_FILE";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Cost plugin configuration, resolved once at startup
#[derive(Clone, Debug, PartialEq)]
pub struct PluginConfig {
    pub region: String,
    pub max_batch_size: usize,
    pub strict_validation: bool,
    /// Pricing catalog to load instead of the bundled one
    pub pricing_file: Option<PathBuf>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            strict_validation: false,
            pricing_file: None,
        }
    }
}

fn parse_flag(key: &str) -> Result<bool, ConfigError> {
    let Some(raw) = env_non_empty(key) else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::ParseError {
            key: key.to_string(),
            details: format!("expected true or false, got '{raw}'"),
        }),
    }
}

impl FromEnv for PluginConfig {
    /// Reads from environment variables:
    /// - COST_PLUGIN_REGION, then deprecated PULUMICOST_PLUGIN_REGION,
    ///   then AWS_REGION; defaults to us-east-1
    /// - COST_PLUGIN_MAX_BATCH_SIZE: defaults to 100, must be positive
    /// - COST_PLUGIN_STRICT_VALIDATION: defaults to false
    /// - COST_PLUGIN_PRICING_FILE: optional
    fn from_env() -> Result<Self, ConfigError> {
        let region = env_with_aliases(REGION_VAR, &[DEPRECATED_REGION_VAR])
            .or_else(|| env_non_empty(LEGACY_REGION_VAR))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let max_batch_size = env_parse_or(MAX_BATCH_SIZE_VAR, DEFAULT_MAX_BATCH_SIZE)?;
        if max_batch_size == 0 {
            return Err(ConfigError::ParseError {
                key: MAX_BATCH_SIZE_VAR.to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            region,
            max_batch_size,
            strict_validation: parse_flag(STRICT_VALIDATION_VAR)?,
            pricing_file: env_non_empty(PRICING_FILE_VAR).map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 6] = [
        REGION_VAR,
        DEPRECATED_REGION_VAR,
        LEGACY_REGION_VAR,
        MAX_BATCH_SIZE_VAR,
        STRICT_VALIDATION_VAR,
        PRICING_FILE_VAR,
    ];

    #[test]
    fn test_plugin_config_defaults() {
        temp_env::with_vars_unset(ALL_VARS, || {
            let config = PluginConfig::from_env().unwrap();
            assert_eq!(config, PluginConfig::default());
        });
    }

    #[test]
    fn test_region_precedence() {
        temp_env::with_vars_unset(ALL_VARS, || {
            temp_env::with_vars(
                [
                    (REGION_VAR, Some("eu-west-1")),
                    (DEPRECATED_REGION_VAR, Some("us-west-2")),
                    (LEGACY_REGION_VAR, Some("ap-south-1")),
                ],
                || assert_eq!(PluginConfig::from_env().unwrap().region, "eu-west-1"),
            );
            temp_env::with_vars(
                [
                    (DEPRECATED_REGION_VAR, Some("us-west-2")),
                    (LEGACY_REGION_VAR, Some("ap-south-1")),
                ],
                || assert_eq!(PluginConfig::from_env().unwrap().region, "us-west-2"),
            );
            temp_env::with_var(LEGACY_REGION_VAR, Some("ap-south-1"), || {
                assert_eq!(PluginConfig::from_env().unwrap().region, "ap-south-1");
            });
        });
    }

    #[test]
    fn test_batch_size_must_be_positive() {
        temp_env::with_vars_unset(ALL_VARS, || {
            temp_env::with_var(MAX_BATCH_SIZE_VAR, Some("0"), || {
                assert!(PluginConfig::from_env().is_err());
            });
            temp_env::with_var(MAX_BATCH_SIZE_VAR, Some("many"), || {
                assert!(PluginConfig::from_env().is_err());
            });
            temp_env::with_var(MAX_BATCH_SIZE_VAR, Some("25"), || {
                assert_eq!(PluginConfig::from_env().unwrap().max_batch_size, 25);
            });
        });
    }

    #[test]
    fn test_strict_validation_and_pricing_file() {
        temp_env::with_vars_unset(ALL_VARS, || {
            temp_env::with_vars(
                [
                    (STRICT_VALIDATION_VAR, Some("TRUE")),
                    (PRICING_FILE_VAR, Some("/etc/cost/us-east-1.json")),
                ],
                || {
                    let config = PluginConfig::from_env().unwrap();
                    assert!(config.strict_validation);
                    assert_eq!(
                        config.pricing_file,
                        Some(PathBuf::from("/etc/cost/us-east-1.json"))
                    );
                },
            );
            temp_env::with_var(STRICT_VALIDATION_VAR, Some("maybe"), || {
                assert!(PluginConfig::from_env().is_err());
            });
        });
    }
}
