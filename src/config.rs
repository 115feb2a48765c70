use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::encode::OutputFormat;
use crate::index::HandleWidth;

/// Contents of `covx.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Width of the handles the index hands out: u16, u32 or u64
    #[serde(default)]
    pub handle_width: HandleWidth,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            pretty: default_pretty(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Default log filter, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Json]
}

fn default_pretty() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_toml(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.output.formats.is_empty() {
            anyhow::bail!("[output] formats must name at least one format");
        }

        if self.log.level.parse::<tracing::Level>().is_err() {
            anyhow::bail!(
                "[log] level '{}' is not one of trace, debug, info, warn, error",
                self.log.level
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[index]
handle_width = "u64"

[output]
formats = ["json", "size"]
pretty = false

[log]
level = "debug"
"#;

        let config = Config::from_toml(toml_content).unwrap();
        assert_eq!(config.index.handle_width, HandleWidth::U64);
        assert_eq!(config.output.formats, vec![OutputFormat::Json, OutputFormat::Size]);
        assert!(!config.output.pretty);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.index.handle_width, HandleWidth::U32);
        assert_eq!(config.output.formats, vec![OutputFormat::Json]);
        assert!(config.output.pretty);
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_toml("[index]\nhandle_width = \"u128\"").is_err());
        assert!(Config::from_toml("[output]\nformats = []").is_err());
        assert!(Config::from_toml("[log]\nlevel = \"loud\"").is_err());
        assert!(Config::from_toml("[extra]\nkey = 1").is_err());
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("covx.toml");
        let config = Config::load_or_default(&missing).unwrap();
        assert_eq!(config.output.formats, vec![OutputFormat::Json]);

        fs::write(&missing, "[output]\nformats = [\"xml\"]\n").unwrap();
        let config = Config::load_or_default(&missing).unwrap();
        assert_eq!(config.output.formats, vec![OutputFormat::Xml]);
    }
}
