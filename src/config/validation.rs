use crate::config::types::{
    Config, CrawlerConfig, ExtractionConfig, OutputConfig, TargetConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_extraction_config(&config.extraction)?;
    if let Some(target) = &config.target {
        validate_target_config(target)?;
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.limit < 1 {
        return Err(ConfigError::Validation(format!(
            "limit must be >= 1, got {}",
            config.limit
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.min_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms must be >= 100ms, got {}ms",
            config.min_delay_ms
        )));
    }

    if config.max_delay_ms < config.min_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_delay_ms ({}ms) must not be below min_delay_ms ({}ms)",
            config.max_delay_ms, config.min_delay_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.frontier_multiplier < 1 {
        return Err(ConfigError::Validation(format!(
            "frontier_multiplier must be >= 1, got {}",
            config.frontier_multiplier
        )));
    }

    if config.run_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "run_timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // The name doubles as the robots.txt product token
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only ASCII letters, digits, '-' or '_', got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.export_dir.is_empty() {
        return Err(ConfigError::Validation(
            "export_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the extraction vocabulary
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    let lists = [
        ("company_words", &config.company_words),
        ("contact_words", &config.contact_words),
        ("site_words", &config.site_words),
        ("address_words", &config.address_words),
    ];

    for (name, list) in lists {
        if list.iter().any(|w| w.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{} cannot contain blank entries",
                name
            )));
        }
    }

    if config.company_words.is_empty() {
        return Err(ConfigError::Validation(
            "company_words must list at least one token".to_string(),
        ));
    }

    Ok(())
}

/// Validates the optional default target
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.seed_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "seed_url '{}' must use http or https",
            config.seed_url
        )));
    }

    if let Some(domain) = &config.allowed_domain {
        validate_domain_string(domain)?;
    }

    Ok(())
}

/// Validates a domain suffix such as `example.co.jp`
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('-') || domain.ends_with('.') || domain.ends_with('-') {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot start with '-' or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
