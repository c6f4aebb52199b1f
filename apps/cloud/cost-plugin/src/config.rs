//! Configuration for the cost plugin

use core_config::plugin::PluginConfig;
use core_config::{Environment, FromEnv};
use domain_costing::{EngineSettings, PricingCatalog};
use eyre::{Result, WrapErr};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub plugin: PluginConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let plugin = PluginConfig::from_env().wrap_err("Invalid cost plugin configuration")?;

        Ok(Self {
            environment: Environment::from_env(),
            plugin,
        })
    }

    /// Settings handed to the engine by value
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            region: self.plugin.region.clone(),
            max_batch_size: self.plugin.max_batch_size,
            strict_validation: self.plugin.strict_validation,
        }
    }

    /// Load the configured pricing catalog, or the bundled one
    pub fn load_pricing(&self) -> Result<PricingCatalog> {
        match &self.plugin.pricing_file {
            Some(path) => {
                info!(path = %path.display(), "Loading pricing catalog");
                PricingCatalog::from_path(path)
                    .wrap_err_with(|| format!("Failed to load pricing catalog {}", path.display()))
            }
            None => PricingCatalog::bundled().wrap_err("Failed to load bundled pricing catalog"),
        }
    }
}
