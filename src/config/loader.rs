//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load_config`] with an explicit variable lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    let mut errors = match apply_env_overrides(&mut config, lookup) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };
    if let Err(mut more) = validate_config(&config) {
        errors.append(&mut more);
    }

    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

/// Apply the deployment environment variables on top of `config`.
///
/// Empty variables are treated as unset.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), Vec<ValidationError>>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    let mut errors = Vec::new();

    if let Some(address) = var("CAMERA_URL") {
        config.upstream.address = address;
    }
    if let Some(path) = var("REQUEST_URL") {
        config.upstream.request_path = path;
    }
    if let Some(user) = var("CAMERA_USER") {
        config.upstream.username = Some(user);
    }
    if let Some(password) = var("CAMERA_PASSWORD") {
        config.upstream.password = Some(password);
    }

    if let Some(port) = var("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.listener.bind_address = format!("[::]:{}", port),
            Err(_) => errors.push(ValidationError::InvalidEnvValue { name: "PORT", value: port }),
        }
    }

    for (name, slot) in [
        ("REQUEST_TIMEOUT_MS", &mut config.timeouts.request_ms),
        ("CONNECT_TIMEOUT_MS", &mut config.timeouts.connect_ms),
    ] {
        if let Some(value) = var(name) {
            match value.trim().parse::<u64>() {
                Ok(ms) => *slot = ms,
                Err(_) => errors.push(ValidationError::InvalidEnvValue { name, value }),
            }
        }
    }

    if let Some(address) = var("METRICS_ADDRESS") {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = address;
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn environment_alone_is_enough() {
        let config = load_config_with(
            None,
            env(&[
                ("CAMERA_URL", "camera.local:80"),
                ("REQUEST_URL", "/snapshot.jpg"),
                ("CAMERA_USER", "admin"),
                ("CAMERA_PASSWORD", "s3cr3t"),
                ("PORT", "9000"),
            ]),
        )
        .unwrap();

        assert_eq!(config.upstream.address, "camera.local:80");
        assert_eq!(config.upstream.request_path, "/snapshot.jpg");
        assert_eq!(config.upstream.username.as_deref(), Some("admin"));
        assert_eq!(config.upstream.password.as_deref(), Some("s3cr3t"));
        assert_eq!(config.listener.bind_address, "[::]:9000");
    }

    #[test]
    fn missing_camera_settings_refuse_to_load() {
        let err = load_config_with(None, env(&[])).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.iter().all(ValidationError::is_missing));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn bad_numbers_are_reported_not_ignored() {
        let err = load_config_with(
            None,
            env(&[
                ("CAMERA_URL", "camera.local"),
                ("REQUEST_URL", "/snapshot.jpg"),
                ("PORT", "eighty"),
                ("REQUEST_TIMEOUT_MS", "-1"),
            ]),
        )
        .unwrap_err();

        let ConfigError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidEnvValue { name: "PORT", value: "eighty".into() },
                ValidationError::InvalidEnvValue { name: "REQUEST_TIMEOUT_MS", value: "-1".into() },
            ]
        );
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [upstream]
            address = "10.0.0.5:8080"
            request_path = "/cgi-bin/snapshot.cgi"

            [timeouts]
            request_ms = 2500
            "#
        )
        .unwrap();

        let config = load_config_with(
            Some(file.path()),
            env(&[("REQUEST_URL", "/snapshot.jpg"), ("CAMERA_URL", "")]),
        )
        .unwrap();

        assert_eq!(config.upstream.address, "10.0.0.5:8080");
        assert_eq!(config.upstream.request_path, "/snapshot.jpg");
        assert_eq!(config.timeouts.request_ms, 2500);
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let err = load_config_with(Some(Path::new("/nonexistent/gateway.toml")), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
