use std::{env, fmt};

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::service::{CertificateSource, CredentialConfig, SecretValue};

/// Certificate and password handed to the signer.
///
/// Never inspected by the login flow; `Debug` keeps both out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub certificate_base64: String,
    pub password: String,
}

impl Credential {
    pub fn new(certificate_base64: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            certificate_base64: certificate_base64.into(),
            password: password.into(),
        }
    }

    /// Resolve configured references (literal, env var, file).
    pub async fn from_config(config: &CredentialConfig) -> Result<Self> {
        let certificate_base64 = resolve_certificate(&config.certificate).await?;
        let password = resolve_secret(&config.password).await?;
        Ok(Self { certificate_base64, password })
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("certificate_base64", &format_args!("<{} chars>", self.certificate_base64.len()))
            .field("password", &"<redacted>")
            .finish()
    }
}

async fn resolve_certificate(source: &CertificateSource) -> Result<String> {
    match source {
        CertificateSource::Base64 { value } => Ok(value.trim().to_owned()),
        CertificateSource::FromEnv { from_env } => env::var(from_env)
            .map(|value| value.trim().to_owned())
            .map_err(|err| anyhow!("certificate env '{}': {}", from_env, err)),
        CertificateSource::FromFile { path } => tokio::fs::read(path)
            .await
            .map(|bytes| STANDARD.encode(bytes))
            .with_context(|| format!("reading certificate file '{}'", path)),
    }
}

async fn resolve_secret(value: &SecretValue) -> Result<String> {
    match value {
        SecretValue::Literal { value } => Ok(value.to_owned()),
        SecretValue::FromEnv { from_env } => {
            env::var(from_env).map_err(|err| anyhow!("password env '{}': {}", from_env, err))
        }
        SecretValue::FromFile { path } => tokio::fs::read_to_string(path)
            .await
            .map(|res| res.trim().to_string())
            .with_context(|| format!("reading password file '{}'", path)),
    }
}
