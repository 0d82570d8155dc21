use crate::config::{BridgeConfig, TenancyMode};
use crate::error::{Error, Result};

/// Validates a route path
fn validate_path(field: &str, path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(Error::ConfigInvalid(format!(
            "{} must start with '/', got '{}'",
            field, path
        )));
    }

    Ok(())
}

/// Validates that a numeric setting is non-zero
fn validate_positive(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::ConfigInvalid(format!("{} must be greater than zero", field)));
    }

    Ok(())
}

/// Validates the tenancy settings
pub fn validate_tenancy(tenancy: &TenancyMode) -> Result<()> {
    if let TenancyMode::Single { credential } = tenancy {
        if credential.is_empty() {
            return Err(Error::ConfigInvalid(
                "Single-tenant mode requires a non-empty credential".to_string(),
            ));
        }
    }

    Ok(())
}

/// Full configuration validation
pub fn validate_config(config: &BridgeConfig) -> Result<()> {
    if config.address.trim().is_empty() {
        return Err(Error::ConfigInvalid("Bind address is empty".to_string()));
    }

    validate_path("ssePath", &config.sse_path)?;
    validate_path("messagesPath", &config.messages_path)?;
    if config.sse_path == config.messages_path {
        return Err(Error::ConfigInvalid(
            "ssePath and messagesPath must differ".to_string(),
        ));
    }

    if let Some(workers) = config.workers {
        validate_positive("workers", workers as u64)?;
    }
    validate_positive("backendInitTimeoutSecs", config.backend_init_timeout_secs)?;
    validate_positive("invocationTimeoutSecs", config.invocation_timeout_secs)?;
    validate_positive("channelCapacity", config.channel_capacity as u64)?;
    validate_positive("keepAliveSecs", config.keep_alive_secs)?;
    validate_positive("maxMessageBytes", config.max_message_bytes as u64)?;

    validate_tenancy(&config.tenancy)?;

    Ok(())
}
