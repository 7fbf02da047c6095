//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core components. The intent is to avoid reading process-wide environment
//! variables (or consulting a configuration singleton) while reconciling, so that concurrent
//! reconciliation calls only ever share immutable state.

use crate::constants::{
    DEFAULT_CONDITION_ID_SYSTEM, DEFAULT_OBSERVATION_ID_SYSTEM, DEFAULT_PATIENT_ID_SYSTEM,
};
use crate::{CoreError, CoreResult};
use serde::Deserialize;
use std::path::Path;

/// Identifier systems per identifier kind.
///
/// Each value doubles as the salt prepended to raw identifiers before hashing, so changing one
/// changes every pseudonym (and every resource id) derived from it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentifierSystems {
    #[serde(rename = "patientIdSystem")]
    pub patient_id: String,
    #[serde(rename = "conditionIdSystem")]
    pub condition_id: String,
    #[serde(rename = "observationIdSystem")]
    pub observation_id: String,
}

impl Default for IdentifierSystems {
    fn default() -> Self {
        Self {
            patient_id: DEFAULT_PATIENT_ID_SYSTEM.into(),
            condition_id: DEFAULT_CONDITION_ID_SYSTEM.into(),
            observation_id: DEFAULT_OBSERVATION_ID_SYSTEM.into(),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    systems: IdentifierSystems,
}

/// On-disk YAML layout.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    systems: IdentifierSystems,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if any system string is empty or whitespace.
    pub fn new(systems: IdentifierSystems) -> CoreResult<Self> {
        for (name, value) in [
            ("patientIdSystem", &systems.patient_id),
            ("conditionIdSystem", &systems.condition_id),
            ("observationIdSystem", &systems.observation_id),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidConfig(format!("{name} cannot be empty")));
            }
        }

        Ok(Self { systems })
    }

    /// Build configuration from optional values, typically read from the environment.
    ///
    /// Missing or blank values fall back to the defaults in [`crate::constants`].
    pub fn from_env_values(
        patient_id: Option<String>,
        condition_id: Option<String>,
        observation_id: Option<String>,
    ) -> CoreResult<Self> {
        fn or_default(value: Option<String>, default: &str) -> String {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        }

        Self::new(IdentifierSystems {
            patient_id: or_default(patient_id, DEFAULT_PATIENT_ID_SYSTEM),
            condition_id: or_default(condition_id, DEFAULT_CONDITION_ID_SYSTEM),
            observation_id: or_default(observation_id, DEFAULT_OBSERVATION_ID_SYSTEM),
        })
    }

    /// Parse configuration from YAML text.
    ///
    /// Expected layout:
    ///
    /// ```yaml
    /// systems:
    ///   patientIdSystem: https://example.org/patient-id
    ///   conditionIdSystem: https://example.org/condition-id
    ///   observationIdSystem: https://example.org/observation-id
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] naming the failing path if the YAML does not match
    /// the layout (unknown keys included), or if any value is blank.
    pub fn from_yaml(yaml_text: &str) -> CoreResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let file = match serde_path_to_error::deserialize::<_, ConfigFile>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(CoreError::InvalidConfig(format!(
                    "config schema mismatch at {path}: {source}"
                )));
            }
        };

        Self::new(file.systems)
    }

    /// Read and parse a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(CoreError::ConfigRead)?;
        Self::from_yaml(&text)
    }

    pub fn systems(&self) -> &IdentifierSystems {
        &self.systems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn new_rejects_blank_systems() {
        let systems = IdentifierSystems {
            condition_id: "   ".into(),
            ..IdentifierSystems::default()
        };

        let err = CoreConfig::new(systems).expect_err("blank system");
        match err {
            CoreError::InvalidConfig(msg) => assert!(msg.contains("conditionIdSystem")),
            other => panic!("expected InvalidConfig error, got {other:?}"),
        }
    }

    #[test]
    fn from_env_values_falls_back_to_defaults() {
        let config = CoreConfig::from_env_values(Some("  pat-salt ".into()), None, Some("".into()))
            .expect("valid config");

        assert_eq!(config.systems().patient_id, "pat-salt");
        assert_eq!(config.systems().condition_id, DEFAULT_CONDITION_ID_SYSTEM);
        assert_eq!(config.systems().observation_id, DEFAULT_OBSERVATION_ID_SYSTEM);
    }

    #[test]
    fn parses_yaml_layout() {
        let input = r#"systems:
  patientIdSystem: https://example.org/pid
  conditionIdSystem: https://example.org/cid
  observationIdSystem: https://example.org/oid
"#;

        let config = CoreConfig::from_yaml(input).expect("parse config");
        assert_eq!(config.systems().patient_id, "https://example.org/pid");
        assert_eq!(config.systems().condition_id, "https://example.org/cid");
        assert_eq!(config.systems().observation_id, "https://example.org/oid");
    }

    #[test]
    fn yaml_rejects_unknown_keys() {
        let input = r#"systems:
  patientIdSystem: a
  conditionIdSystem: b
  observationIdSystem: c
  surrogateIdSystem: d
"#;

        let err = CoreConfig::from_yaml(input).expect_err("unknown key");
        match err {
            CoreError::InvalidConfig(msg) => assert!(msg.contains("surrogateIdSystem")),
            other => panic!("expected InvalidConfig error, got {other:?}"),
        }
    }

    #[test]
    fn yaml_reports_missing_fields() {
        let input = "systems:\n  patientIdSystem: a\n  conditionIdSystem: b\n";

        let err = CoreConfig::from_yaml(input).expect_err("missing observation system");
        match err {
            CoreError::InvalidConfig(msg) => assert!(msg.contains("observationIdSystem")),
            other => panic!("expected InvalidConfig error, got {other:?}"),
        }
    }

    #[test]
    fn reads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "systems:\n  patientIdSystem: p\n  conditionIdSystem: c\n  observationIdSystem: o"
        )
        .expect("write config");

        let config = CoreConfig::from_yaml_file(file.path()).expect("read config");
        assert_eq!(config.systems().patient_id, "p");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = CoreConfig::from_yaml_file(&dir.path().join("absent.yaml"))
            .expect_err("file does not exist");
        assert!(matches!(err, CoreError::ConfigRead(_)));
    }
}
