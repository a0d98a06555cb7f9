//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::EngineConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: EngineConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID_CONFIG: &str = r#"
        [selection]
        safety_valve = "embedded"
        emergency_chain = ["embedded"]

        [[backends]]
        name = "cloud-a"
        kind = "cloud"
        endpoint = "https://api.example.com/v1"
        cost_per_unit = 3.0

        [backends.capabilities]
        reasoning = 0.9
        multimodal = 0.8

        [[backends.quotas]]
        resource = "requests"
        limit = 60
        window_secs = 60

        [[backends.quotas]]
        resource = "requests"
        limit = 5000
        window_secs = 86400

        [[backends]]
        name = "embedded"
        kind = "embedded-local"
        cost_per_unit = 0.0

        [backends.capabilities]
        reasoning = 0.4
    "#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.selection.safety_valve, "embedded");
        assert_eq!(config.backends[0].quotas.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/engine.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let file = write_config("backends = not toml");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_config_is_validation_error() {
        let file = write_config(
            r#"
            [[backends]]
            name = "cloud-a"
            kind = "cloud"
        "#,
        );
        let err = load_config(file.path()).unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert!(!errors.is_empty()),
            other => panic!("expected validation error, got {}", other),
        }
    }
}
