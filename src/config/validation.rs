use crate::config::types::{
    AuditConfig, Config, CrawlerConfig, PlanLimits, ServerConfig, StorageConfig, UserAgentConfig,
};
use crate::ConfigError;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_server_config(&config.server)?;
    validate_storage_config(&config.storage)?;
    validate_audit_config(&config.audit)?;
    validate_plans(&config.plans)?;

    if config.quota.stale_lock_secs == 0 {
        return Err(ConfigError::Validation(
            "stale_lock_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 32, got {}",
            config.concurrency
        )));
    }

    if config.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "page_timeout_secs must be >= 1, got {}",
            config.page_timeout_secs
        )));
    }

    if config.progress_window_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "progress_window_ms must be >= 10ms, got {}ms",
            config.progress_window_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind_address.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!(
            "bind_address '{}' is not a socket address: {}",
            config.bind_address, e
        ))
    })?;
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_audit_config(config: &AuditConfig) -> Result<(), ConfigError> {
    if config.enabled {
        Url::parse(&config.endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid audit endpoint: {}", e)))?;
    }
    Ok(())
}

/// Validates plan entries
///
/// A plan with a zero page limit could never make progress, so it is
/// rejected up front rather than at admission time.
fn validate_plans(plans: &BTreeMap<String, PlanLimits>) -> Result<(), ConfigError> {
    if plans.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [plans.<name>] table is required".to_string(),
        ));
    }

    for (name, limits) in plans {
        if name.is_empty() {
            return Err(ConfigError::UnknownPlan("plan name cannot be empty".into()));
        }

        if limits.per_website_page_limit < 1 {
            return Err(ConfigError::Validation(format!(
                "plan '{}' must allow at least one page per website",
                name
            )));
        }
    }

    Ok(())
}
