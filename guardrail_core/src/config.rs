//! Configuration file support for the guardrail calculator.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/guardrail/config.toml`.

use crate::{BandPolicy, CalculationSettings, Error, Result, UnitPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub infusion: InfusionConfig,

    #[serde(default)]
    pub compatibility: CompatibilityConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Infusion protocol parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InfusionConfig {
    /// Syringe diluent volume in mL
    #[serde(default = "default_diluent_volume_ml")]
    pub diluent_volume_ml: f64,
}

impl Default for InfusionConfig {
    fn default() -> Self {
        Self {
            diluent_volume_ml: default_diluent_volume_ml(),
        }
    }
}

/// Switches that reproduce known defects of the legacy calculator
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct CompatibilityConfig {
    /// Leave weights in (2.4, 2.5] kg without a band
    #[serde(default)]
    pub legacy_weight_gap: bool,

    /// Pass unconvertible unit pairs through unchanged. This also skips the
    /// mcg/kg/min → mcg/kg/hr conversion, so those doses are range-checked
    /// as entered
    #[serde(default)]
    pub legacy_unit_passthrough: bool,
}

impl CompatibilityConfig {
    pub fn legacy() -> Self {
        Self {
            legacy_weight_gap: true,
            legacy_unit_passthrough: true,
        }
    }
}

/// Optional site-specific catalog
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_diluent_volume_ml() -> f64 {
    crate::DEFAULT_DILUENT_VOLUME_ML
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            config_path => {
                tracing::info!(
                    "No config file found at {:?}, using defaults",
                    config_path
                );
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("guardrail").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values the calculation cannot work with
    pub fn validate(&self) -> Result<()> {
        let volume = self.infusion.diluent_volume_ml;
        if !volume.is_finite() || volume <= 0.0 {
            return Err(Error::Config(format!(
                "diluent_volume_ml must be positive, got {}",
                volume
            )));
        }
        Ok(())
    }

    /// Engine settings derived from this configuration
    pub fn settings(&self) -> CalculationSettings {
        CalculationSettings {
            diluent_volume_ml: self.infusion.diluent_volume_ml,
            unit_policy: if self.compatibility.legacy_unit_passthrough {
                UnitPolicy::Passthrough
            } else {
                UnitPolicy::Strict
            },
            band_policy: if self.compatibility.legacy_weight_gap {
                BandPolicy::LegacyGap
            } else {
                BandPolicy::Contiguous
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.infusion.diluent_volume_ml, 25.0);
        assert!(!config.compatibility.legacy_weight_gap);
        assert!(!config.compatibility.legacy_unit_passthrough);
        assert_eq!(config.settings(), CalculationSettings::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            compatibility: CompatibilityConfig::legacy(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.settings(), CalculationSettings::legacy());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[infusion]
diluent_volume_ml = 50.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.infusion.diluent_volume_ml, 50.0);
        assert!(!config.compatibility.legacy_weight_gap); // default
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn test_rejects_non_positive_volume() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[infusion]\ndiluent_volume_ml = 0.0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
