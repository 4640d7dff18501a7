use figment::{
    providers::{Env, Format, Toml},
    value::Uncased,
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Flat environment variables understood for compatibility with existing
/// deployments, and the config key each one sets.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("ACESTEP_URL", "backend.url"),
    ("ACESTEP_API_KEY", "backend.api_key"),
    ("QUEUE_URL", "queue.url"),
    ("QUEUE_TOKENS", "queue.tokens"),
    ("WRAPPER_PORT", "server.port"),
];

/// Load configuration from an optional TOML file with environment variable overrides.
///
/// Precedence (lowest first): built-in defaults, the TOML file, the legacy
/// flat variables (`ACESTEP_URL`, `QUEUE_TOKENS`, ...), then nested
/// `LEGO_<SECTION>__<KEY>` variables.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
    }

    figment(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    Figment::from(Toml::string(toml_str))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn figment(path: Option<&Path>) -> Figment {
    let mut figment = Figment::new();
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment
        .merge(legacy_env())
        .merge(Env::prefixed("LEGO_").ignore(&["CONFIG"]).split("__"))
}

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        LEGACY_ENV
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, path)| Uncased::from(*path))
            .unwrap_or_else(|| Uncased::from(key.as_str().to_string()))
    })
}
