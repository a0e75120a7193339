//! Machine configuration.
//!
//! Read from JSON. Every field is optional; a missing field takes the
//! value of the reference configuration (diagnostic preloaded, CPU0 and
//! MSCH enabled).
//!
//! ```json
//! {
//!   "preload_diagnostic": false,
//!   "step_limit": 5000,
//!   "units": [
//!     { "unit": "CPU0", "image": "cpu0.rom" },
//!     { "unit": "MSCH", "enabled": false }
//!   ]
//! }
//! ```

use crate::cpu::unit::UnitId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Units enabled when the configuration does not say otherwise.
pub const REFERENCE_UNITS: [UnitId; 2] = [UnitId::Cpu0, UnitId::Msch];

/// Whole-machine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Load the built-in diagnostic into CPU0 at bootstrap.
    pub preload_diagnostic: bool,
    /// Scheduler iterations to run before stopping, unbounded if absent.
    pub step_limit: Option<u64>,
    /// Per-unit settings. Units not listed keep their reference settings.
    pub units: Vec<UnitConfig>,
}

/// Settings for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConfig {
    pub unit: UnitId,
    /// Defaults to the unit's reference setting.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// ROM text image for the unit's control store.
    #[serde(default)]
    pub image: Option<PathBuf>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            preload_diagnostic: true,
            step_limit: None,
            units: Vec::new(),
        }
    }
}

impl MachineConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: MachineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::IoError {
            path: path.as_ref().to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&text)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (i, entry) in self.units.iter().enumerate() {
            if self.units[..i].iter().any(|other| other.unit == entry.unit) {
                return Err(ConfigError::DuplicateUnit(entry.unit));
            }
        }
        Ok(())
    }

    /// Settings entry for a unit, if listed.
    pub fn unit(&self, unit: UnitId) -> Option<&UnitConfig> {
        self.units.iter().find(|entry| entry.unit == unit)
    }

    /// Whether a unit takes part in scheduling.
    pub fn is_enabled(&self, unit: UnitId) -> bool {
        self.unit(unit)
            .and_then(|entry| entry.enabled)
            .unwrap_or_else(|| REFERENCE_UNITS.contains(&unit))
    }

    /// ROM image path configured for a unit.
    pub fn image(&self, unit: UnitId) -> Option<&Path> {
        self.unit(unit).and_then(|entry| entry.image.as_deref())
    }

    /// Set (or add) the image path of a unit.
    pub fn set_image(&mut self, unit: UnitId, path: PathBuf) {
        match self.units.iter_mut().find(|entry| entry.unit == unit) {
            Some(entry) => entry.image = Some(path),
            None => self.units.push(UnitConfig {
                unit,
                enabled: None,
                image: Some(path),
            }),
        }
    }
}

/// Errors that can occur loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {message}", .path.display())]
    IoError { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("unit {0} listed more than once")]
    DuplicateUnit(UnitId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reference_configuration() {
        let config = MachineConfig::default();
        assert!(config.preload_diagnostic);
        assert_eq!(config.step_limit, None);
        let enabled: Vec<_> = UnitId::ALL
            .into_iter()
            .filter(|&u| config.is_enabled(u))
            .collect();
        assert_eq!(enabled, vec![UnitId::Cpu0, UnitId::Msch]);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(MachineConfig::from_json("{}").unwrap(), MachineConfig::default());
    }

    #[test]
    fn test_parse_unit_overrides() {
        let config = MachineConfig::from_json(
            r#"{
                "preload_diagnostic": false,
                "step_limit": 40,
                "units": [
                    { "unit": "CHIO", "enabled": true, "image": "chio.rom" },
                    { "unit": "MSCH", "enabled": false }
                ]
            }"#,
        )
        .unwrap();
        assert!(!config.preload_diagnostic);
        assert_eq!(config.step_limit, Some(40));
        assert!(config.is_enabled(UnitId::Cpu0));
        assert!(config.is_enabled(UnitId::Chio));
        assert!(!config.is_enabled(UnitId::Msch));
        assert_eq!(config.image(UnitId::Chio), Some(Path::new("chio.rom")));
        assert_eq!(config.image(UnitId::Cpu0), None);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            MachineConfig::from_json(r#"{"units": [{"unit": "CPU7"}]}"#),
            Err(ConfigError::ParseError(_))
        ));
        assert!(matches!(
            MachineConfig::from_json(r#"{"units": [{"unit": "AMC"}, {"unit": "AMC"}]}"#),
            Err(ConfigError::DuplicateUnit(UnitId::Amc))
        ));
    }

    #[test]
    fn test_set_image_and_serialize() {
        let mut config = MachineConfig::default();
        config.set_image(UnitId::Cpu0, PathBuf::from("a.rom"));
        config.set_image(UnitId::Cpu0, PathBuf::from("b.rom"));
        assert_eq!(config.units.len(), 1);
        let json = config.to_json().unwrap();
        assert_eq!(MachineConfig::from_json(&json).unwrap(), config);
    }
}
