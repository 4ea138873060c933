use crate::config::types::{Config, CrawlerConfig, OutputConfig};
use crate::url::UrlFilter;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;

    // Compiling the filter surfaces any malformed pattern
    UrlFilter::from_config(&config.urls)?;

    if config.urls.allowed.is_empty() {
        tracing::warn!("No allowed URL patterns configured; nothing will be crawlable");
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_user_agent(&config.user_agent)?;

    if config.minimum_crawl_interval == 0 {
        return Err(ConfigError::Validation(
            "minimum-crawl-interval must be greater than zero".to_string(),
        ));
    }

    if config.robots_refresh_interval == 0 {
        return Err(ConfigError::Validation(
            "robots-refresh-interval must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

/// The agent doubles as a robots.txt group token, so it must be a single word
fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if user_agent.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "user-agent must not contain whitespace, got '{}'",
            user_agent
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
