//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    if config.environment.trim().is_empty() {
        errors.push("environment must not be empty".to_string());
    }

    for (name, env) in &config.environments {
        if env.endpoint.trim().is_empty() {
            errors.push(format!("environments.{}.endpoint must not be empty", name));
        }
        if env.agent_id.trim().is_empty() {
            errors.push(format!("environments.{}.agent_id must not be empty", name));
        }
        if env.request_timeout_secs == 0 {
            errors.push(format!(
                "environments.{}.request_timeout_secs must be > 0",
                name
            ));
        }
    }

    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    if !LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(format!(
            "logging.level must be one of {:?}, got '{}'",
            LEVELS, config.logging.level
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Config(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvironmentConfig;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.environments.insert(
            "default".to_string(),
            EnvironmentConfig {
                endpoint: "https://agents.example.com".to_string(),
                agent_id: "crm-agent".to_string(),
                api_key: String::new(),
                request_timeout_secs: 60,
            },
        );
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_agent_id_fails() {
        let mut config = valid_config();
        config
            .environments
            .get_mut("default")
            .unwrap()
            .agent_id
            .clear();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("agent_id"));
    }

    #[test]
    fn test_zero_timeout_fails() {
        let mut config = valid_config();
        config
            .environments
            .get_mut("default")
            .unwrap()
            .request_timeout_secs = 0;

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_log_level_fails() {
        let mut config = valid_config();
        config.logging.level = "noisy".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }
}
