//! Configuration loading and parsing

use anyhow::{Context, Result};
use bus_log_decoder::ConverterConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory for CSV files (default: next to each input)
    pub output_dir: Option<PathBuf>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let Some(dir) = &config.output.output_dir {
        if !dir.is_dir() {
            log::warn!("Configured output directory {:?} does not exist", dir);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let toml_content = r#"
            [converter]
            time_header = "Time"
            delimiter = ";"

            [output]
            output_dir = "csv"
        "#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.converter.time_header, "Time");
        assert_eq!(config.converter.delimiter, ';');
        assert_eq!(config.converter.blank_cell, " ");
        assert_eq!(config.output.output_dir, Some(PathBuf::from("csv")));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.converter, ConverterConfig::default());
        assert!(config.output.output_dir.is_none());
    }
}
