//! Configuration loading from disk and process overrides.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

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

/// Values supplied by environment variables or command-line flags.
///
/// Each `Some` replaces the corresponding file/default value.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    /// Comma-separated origin list, as found in `ALLOWED_ORIGINS`.
    pub allowed_origins: Option<String>,
    pub max_bytes: Option<u64>,
    pub timeout_ms: Option<u64>,
}

impl Overrides {
    /// Apply the overrides on top of an existing configuration.
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(port) = self.port {
            config.listener.set_port(port);
        }
        if let Some(origins) = &self.allowed_origins {
            config.cors.allowed_origins = split_origins(origins);
        }
        if let Some(max_bytes) = self.max_bytes {
            config.upstream.max_bytes = max_bytes;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.upstream.timeout_ms = timeout_ms;
        }
    }
}

/// Split a comma-separated origin list, trimming entries and dropping blanks.
pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load configuration from an optional TOML file, apply overrides, and validate.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => RelayConfig::default(),
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
    fn test_split_origins() {
        assert_eq!(
            split_origins(" https://a.example.com, ,http://localhost:5173 ,"),
            vec!["https://a.example.com", "http://localhost:5173"]
        );
        assert!(split_origins("").is_empty());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let dir = std::env::temp_dir().join(format!("image-relay-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("relay.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[upstream]\nmax_bytes = 1024\ntimeout_ms = 500\n\n[cors]\nallowed_origins = [\"https://file.example.com\"]"
        )
        .unwrap();

        let overrides = Overrides {
            port: Some(4000),
            timeout_ms: Some(750),
            ..Default::default()
        };
        let config = load_config(Some(&path), &overrides).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:4000");
        assert_eq!(config.upstream.max_bytes, 1024);
        assert_eq!(config.upstream.timeout_ms, 750);
        assert_eq!(config.cors.allowed_origins, vec!["https://file.example.com"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let overrides = Overrides {
            allowed_origins: Some("https://ok.example.com,javascript:alert(1)".into()),
            ..Default::default()
        };
        match load_config(None, &overrides) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Some(Path::new("/definitely/not/here.toml")), &Overrides::default());
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
