// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BOUNCE_DELAY_MS, DEFAULT_ERROR_DELAY_MS,
    DEFAULT_MAX_ERROR_DELAY_MS,
};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Restart policy of the dependency engine.
///
/// Every field is optional in a configuration file; missing fields take the
/// built-in defaults. The manifold graph itself is built in code and is not
/// part of the configuration.
///
/// # Fields
/// * `error_delay_ms` - Base delay before restarting after a generic failure
/// * `max_error_delay_ms` - Cap for the exponential backoff
/// * `backoff_factor` - Multiplier applied per consecutive failure
/// * `bounce_delay_ms` - Delay after a bounce or a clean unrequested exit
///
/// # Example
/// ```yaml
/// error_delay_ms: 3000
/// max_error_delay_ms: 60000
/// backoff_factor: 2.0
/// bounce_delay_ms: 0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub error_delay_ms: u64,
    pub max_error_delay_ms: u64,
    pub backoff_factor: f64,
    pub bounce_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            error_delay_ms: DEFAULT_ERROR_DELAY_MS,
            max_error_delay_ms: DEFAULT_MAX_ERROR_DELAY_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            bounce_delay_ms: DEFAULT_BOUNCE_DELAY_MS,
        }
    }
}

/// Load an engine config from a YAML file, or TOML when the extension is `.toml`
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: display.clone(),
        reason: e.to_string(),
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let parsed = if is_toml {
        toml::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|reason| ConfigError::Malformed {
        path: display,
        reason,
    })
}

/// Load and validate an engine config
///
/// Returns every problem found, not just the first one.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, Vec<ConfigError>> {
    let cfg = load_config(path).map_err(|e| vec![e])?;
    crate::config::validate_config(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_partial_yaml_config() {
        let yaml = r#"
error_delay_ms: 500
backoff_factor: 1.5
"#;

        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.error_delay_ms, 500);
        assert_eq!(cfg.backoff_factor, 1.5);
        assert_eq!(cfg.max_error_delay_ms, DEFAULT_MAX_ERROR_DELAY_MS);
        assert_eq!(cfg.bounce_delay_ms, DEFAULT_BOUNCE_DELAY_MS);
    }

    #[test]
    fn test_load_yaml_file() {
        let file = write_config(".yaml", "max_error_delay_ms: 10000\n");

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.max_error_delay_ms, 10_000);
        assert_eq!(cfg.error_delay_ms, DEFAULT_ERROR_DELAY_MS);
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_config(".toml", "error_delay_ms = 250\nbounce_delay_ms = 10\n");

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.error_delay_ms, 250);
        assert_eq!(cfg.bounce_delay_ms, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        match load_config(&path) {
            Err(ConfigError::Unreadable { path: reported, .. }) => {
                assert!(reported.ends_with("absent.yaml"));
            }
            other => panic!("expected Unreadable, got {:?}", other),
        }
    }

    #[test]
    fn test_load_malformed_file() {
        let file = write_config(".yaml", "error_delay_ms: [not, a, number]\n");

        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_load_and_validate_reports_every_problem() {
        let file = write_config(
            ".yaml",
            "error_delay_ms: 0\nmax_error_delay_ms: 0\nbackoff_factor: 0.5\n",
        );

        let errors = load_and_validate_config(file.path()).unwrap_err();
        assert!(errors.contains(&ConfigError::ZeroErrorDelay));
        assert!(errors.contains(&ConfigError::InvalidBackoffFactor { factor: 0.5 }));
    }

    #[test]
    fn test_load_and_validate_valid_config() {
        let file = write_config(".yaml", "error_delay_ms: 100\nmax_error_delay_ms: 800\n");

        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(cfg.error_delay_ms, 100);
        assert_eq!(cfg.max_error_delay_ms, 800);
    }
}
