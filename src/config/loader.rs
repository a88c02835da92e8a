//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values taken from the process environment / command line that win over
/// whatever the file says.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub primary_url: Option<String>,
    pub decoy_url: Option<String>,
    pub reputation_path: Option<PathBuf>,
}

impl Overrides {
    /// Apply the overrides on top of a parsed configuration.
    pub fn apply(self, config: &mut RouterConfig) {
        if let Some(port) = self.port {
            config.listener.set_port(port);
        }
        if let Some(primary) = self.primary_url {
            config.destinations.primary = primary;
        }
        if let Some(decoy) = self.decoy_url {
            config.destinations.decoy = decoy;
        }
        if let Some(path) = self.reputation_path {
            config.reputation.path = Some(path);
        }
    }
}

/// Parse a configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<RouterConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load the configuration file (if any), apply overrides, and validate.
pub fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<RouterConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_config(&content)?
        }
        None => RouterConfig::default(),
    };

    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [listener]
            bind_address = "127.0.0.1:4000"

            [destinations]
            primary = "https://file-primary.example.com"
            decoy = "https://file-decoy.example.com"
            "#
        )
        .unwrap();

        let overrides = Overrides {
            port: Some(5000),
            decoy_url: Some("https://env-decoy.example.com".into()),
            ..Default::default()
        };
        let config = load_config(Some(file.path()), overrides).unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:5000");
        assert_eq!(config.destinations.primary, "https://file-primary.example.com");
        assert_eq!(config.destinations.decoy, "https://env-decoy.example.com");
    }

    #[test]
    fn test_invalid_destination_fails_loudly() {
        let overrides = Overrides {
            primary_url: Some("".into()),
            ..Default::default()
        };
        let err = load_config(None, overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("primary"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/router.toml")), Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
