use anyhow::{Context, Result, ensure};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::Serialize;
use std::path::Path;

use super::{RepolintConfig, smart_load};

// Embed the default config at compile time
pub(crate) const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Prefix of environment variables that override configuration keys
pub const ENV_PREFIX: &str = "REPOLINT_";

impl RepolintConfig {
    /// Load the layered configuration and validate it
    pub fn load<T: Serialize>(custom_config: Option<&str>, cli_overrides: Option<T>) -> Result<Self> {
        let figment = Self::figment(custom_config, cli_overrides)?;

        let config: RepolintConfig = figment.extract().context("Invalid configuration")?;
        config.validate()?;

        tracing::debug!(
            "Configuration loaded: {} rule(s), {} override(s)",
            config.rules.len(),
            config.overrides.len()
        );
        Ok(config)
    }

    /// The merged figment, lowest priority first
    pub fn figment<T: Serialize>(custom_config: Option<&str>, cli_overrides: Option<T>) -> Result<Figment> {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(base) = Self::user_config_base_path() {
            figment = merge_any_format(figment, &base);
        }
        figment = merge_any_format(figment, "repolint");

        if let Some(path) = custom_config {
            ensure!(Path::new(path).is_file(), "Config file not found: {}", path);
            tracing::trace!("CONFIG LOAD: Applying {}", path);
            figment = figment.merge(smart_load::auto(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(cli) = cli_overrides {
            tracing::trace!("CONFIG LOAD: Applying CLI overrides");
            figment = figment.merge(Serialized::defaults(cli));
        }

        Ok(figment)
    }

    fn user_config_base_path() -> Option<String> {
        std::env::var("HOME")
            .ok()
            .map(|home| format!("{home}/.config/repolint/config"))
    }
}

/// Merge `<base>.toml`, `.json`, `.yaml` and `.yml`; missing files are skipped
fn merge_any_format(figment: Figment, base: &str) -> Figment {
    figment
        .merge(Toml::file(format!("{base}.toml")))
        .merge(Json::file(format!("{base}.json")))
        .merge(Yaml::file(format!("{base}.yaml")))
        .merge(Yaml::file(format!("{base}.yml")))
}
