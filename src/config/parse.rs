use super::types::*;
use crate::config::{env_var_pattern, expand_env_vars};
use crate::document::Severity;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

/// Load a config file. The result is not validated: CLI overrides are
/// applied first, then [`validate_config`] runs on the merged settings.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(inner) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), inner),
        )),
        other => other,
    })
}

/// Parse config YAML, expanding `$env{VAR}` references first
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    // An empty file is a valid, all-defaults config
    if yaml_string.trim().is_empty() {
        return Ok(Config::default());
    }

    Ok(serde_yaml::from_str(&yaml_string)?)
}

/// Checks for unexpanded environment variables and returns a helpful error
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let mut unexpanded_vars: Vec<String> = env_var_pattern()
        .captures_iter(yaml_string)
        .map(|cap| cap[1].to_string())
        .collect();

    if unexpanded_vars.is_empty() {
        return Ok(());
    }

    unexpanded_vars.sort();
    unexpanded_vars.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}",
        unexpanded_vars.join(", ")
    )))
}

/// Validate merged settings, reporting every problem at once
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();
    let generator = &config.generator;

    if generator.index.trim().is_empty() {
        errors.push("index is required (--index or generator.index)".to_string());
    }

    if !generator.rate.is_finite() || generator.rate <= 0.0 {
        errors.push(format!(
            "rate must be a positive number of docs/sec, got {}",
            generator.rate
        ));
    }

    if generator.batch_size == 0 {
        errors.push("batch_size must be at least 1".to_string());
    }

    if generator.threads == 0 {
        errors.push("threads must be at least 1".to_string());
    }

    let weights = &generator.severity_weights;
    if Severity::ALL.iter().all(|level| weights.weight(*level) == 0) {
        errors.push("severity_weights must not all be zero".to_string());
    }

    if config.store.host.trim().is_empty() {
        errors.push("store host must not be empty".to_string());
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(ConfigError::Validation(errors.remove(0))),
        _ => Err(ConfigError::ValidationList(errors)),
    }
}
