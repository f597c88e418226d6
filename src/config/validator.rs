//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * endpoint URLs (scheme, non-empty)
//!   * template placeholders
//!   * retry / logging invariants
//!   * credential and signer presence

use tracing::{error, info};

use crate::config::service::{CertificateSource, CredentialConfig, EndpointPair, SecretValue, ServiceConfig, SignerConfig, TemplatesConfig};
use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::utils::constants::{SEED_PLACEHOLDER, SIGNED_PLACEHOLDER};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_endpoints("certification", &cfg.endpoints.certification, &mut errors);
    validate_endpoints("production", &cfg.endpoints.production, &mut errors);
    validate_templates(&cfg.templates, &mut errors);
    validate_credential(&cfg.credential, &mut errors);
    validate_signer(&cfg.signer, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(retry) = &settings.retry {
        validate_retry(retry, errors);
    }
    if settings.transport.timeout_ms == 0 {
        errors.push("settings.transport.timeout_ms must be > 0".to_string());
    }
    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' is invalid; allowed: {}",
                logging.level,
                LOG_LEVELS.join(", ")
            ));
        }
    }
    if settings.metrics.is_enabled && settings.metrics.path.as_deref().map_or(true, |p| p.trim().is_empty()) {
        errors.push("settings.metrics.path is required when metrics are enabled".to_string());
    }
}

fn validate_retry(retry: &RetryConfig, errors: &mut Vec<String>) {
    if retry.attempts == Some(0) {
        errors.push("settings.retry.attempts must be >= 1".to_string());
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if base > max {
            errors.push(format!(
                "settings.retry.base_delay_ms ({}) must be <= max_delay_ms ({})",
                base, max
            ));
        }
    }
}

fn validate_endpoints(environment: &str, pair: &EndpointPair, errors: &mut Vec<String>) {
    for (field, url) in [("seed_url", &pair.seed_url), ("token_url", &pair.token_url)] {
        if url.trim().is_empty() {
            errors.push(format!("endpoints.{}.{} must not be empty", environment, field));
        } else if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!(
                "endpoints.{}.{} '{}' must start with http:// or https://",
                environment, field, url
            ));
        }
    }
}

fn validate_templates(templates: &TemplatesConfig, errors: &mut Vec<String>) {
    if templates.seed_request.trim().is_empty() {
        errors.push("templates.seed_request must not be empty".to_string());
    }
    if !templates.signing_request.contains(SEED_PLACEHOLDER) {
        errors.push(format!("templates.signing_request must contain '{}'", SEED_PLACEHOLDER));
    }
    if !templates.token_request.contains(SIGNED_PLACEHOLDER) {
        errors.push(format!("templates.token_request must contain '{}'", SIGNED_PLACEHOLDER));
    }
}

fn validate_credential(credential: &CredentialConfig, errors: &mut Vec<String>) {
    let certificate_empty = match &credential.certificate {
        CertificateSource::Base64 { value } => value.trim().is_empty(),
        CertificateSource::FromEnv { from_env } => from_env.trim().is_empty(),
        CertificateSource::FromFile { path } => path.trim().is_empty(),
    };
    if certificate_empty {
        errors.push("credential.certificate must not be empty".to_string());
    }
    let password_reference_empty = match &credential.password {
        // an empty literal password is legal for unprotected certificates
        SecretValue::Literal { .. } => false,
        SecretValue::FromEnv { from_env } => from_env.trim().is_empty(),
        SecretValue::FromFile { path } => path.trim().is_empty(),
    };
    if password_reference_empty {
        errors.push("credential.password reference must not be empty".to_string());
    }
}

fn validate_signer(signer: &SignerConfig, errors: &mut Vec<String>) {
    if signer.command.trim().is_empty() {
        errors.push("signer.command must not be empty".to_string());
    }
}
