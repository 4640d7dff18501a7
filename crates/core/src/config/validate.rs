use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Backend and queue URLs are http(s)
/// - Token count, inference steps, poll interval and batch size are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    validate_url("backend.url", &config.backend.url)?;
    validate_url("queue.url", &config.queue.url)?;

    if config.queue.tokens == 0 {
        return Err(ConfigError::ValidationError(
            "queue.tokens cannot be 0".to_string(),
        ));
    }

    if config.generation.inference_steps == 0 {
        return Err(ConfigError::ValidationError(
            "generation.inference_steps cannot be 0".to_string(),
        ));
    }

    if config.generation.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "generation.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.generation.default_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "generation.default_batch_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{} must be an http(s) URL, got '{}'",
            field, url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationConfig, QueueConfig, ServerConfig};

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                port: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_tokens_fails() {
        let config = Config {
            queue: QueueConfig {
                tokens: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_poll_interval_fails() {
        let config = Config {
            generation: GenerationConfig {
                poll_interval_ms: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_non_http_url_fails() {
        let mut config = Config::default();
        config.backend.url = "acestep:8001".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("backend.url"));
    }
}
