use serde::Deserialize;
use std::fmt;
use tracing::warn;

use crate::config::settings::SettingsConfig;
use crate::utils::constants::*;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    /// environment name as written in the file, see [`ServiceConfig::resolve_environment`]
    #[serde(default, rename = "environment")]
    pub environment_name: Option<String>,
    #[serde(skip)]
    pub environment: Environment,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub templates: TemplatesConfig,
    pub credential: CredentialConfig,
    pub signer: SignerConfig,
}

/// ================================
/// Environment
/// ================================

impl ServiceConfig {
    /// Environment a login should use. `override_name` (command line) wins
    /// over the file. Unrecognized names fall back to certification and are
    /// reported at `warn`, so call this once logging is installed.
    pub fn resolve_environment(&self, override_name: Option<&str>) -> Environment {
        match override_name.or(self.environment_name.as_deref()) {
            Some(name) => Environment::from_name(name).unwrap_or_else(|| {
                warn!("unknown environment '{}', using certification endpoints", name);
                Environment::Certification
            }),
            None => self.environment,
        }
    }
}

/// Which pair of service endpoints a login talks to.
///
/// Conversion from a name is lenient: only the exact name `production`
/// selects production, anything else falls back to certification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Certification,
    Production,
}

impl Environment {
    /// Exact, case-sensitive match of a known environment name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            ENV_PRODUCTION => Some(Environment::Production),
            ENV_CERTIFICATION => Some(Environment::Certification),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Certification => ENV_CERTIFICATION,
            Environment::Production => ENV_PRODUCTION,
        }
    }
}

impl From<&str> for Environment {
    fn from(name: &str) -> Self {
        Environment::from_name(name).unwrap_or_default()
    }
}

impl From<String> for Environment {
    fn from(name: String) -> Self {
        Environment::from(name.as_str())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ================================
/// Endpoints
/// ================================
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EndpointPair {
    pub seed_url: String,
    pub token_url: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EndpointsConfig {
    #[serde(default = "default_certification_endpoints")]
    pub certification: EndpointPair,
    #[serde(default = "default_production_endpoints")]
    pub production: EndpointPair,
}

impl EndpointsConfig {
    pub fn for_environment(&self, environment: Environment) -> &EndpointPair {
        match environment {
            Environment::Production => &self.production,
            Environment::Certification => &self.certification,
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            certification: default_certification_endpoints(),
            production: default_production_endpoints(),
        }
    }
}

fn default_certification_endpoints() -> EndpointPair {
    EndpointPair { seed_url: CERT_SEED_URL.to_owned(), token_url: CERT_TOKEN_URL.to_owned() }
}

fn default_production_endpoints() -> EndpointPair {
    EndpointPair { seed_url: PROD_SEED_URL.to_owned(), token_url: PROD_TOKEN_URL.to_owned() }
}

/// ================================
/// Request templates
/// ================================
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TemplatesConfig {
    #[serde(default = "default_seed_request")]
    pub seed_request: String,
    /// must contain `@seed`
    #[serde(default = "default_signing_request")]
    pub signing_request: String,
    /// must contain `@pszXML`
    #[serde(default = "default_token_request")]
    pub token_request: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            seed_request: default_seed_request(),
            signing_request: default_signing_request(),
            token_request: default_token_request(),
        }
    }
}

fn default_seed_request() -> String {
    SEED_REQUEST_TEMPLATE.to_owned()
}

fn default_signing_request() -> String {
    SIGNING_REQUEST_TEMPLATE.to_owned()
}

fn default_token_request() -> String {
    TOKEN_REQUEST_TEMPLATE.to_owned()
}

/// ================================
/// Credential & signer
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct CredentialConfig {
    pub certificate: CertificateSource,
    pub password: SecretValue,
}

/// Certificate material. `value` and `from_env` hold base64 text,
/// `path` points at the raw certificate file.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum CertificateSource {
    Base64 { value: String },
    FromEnv { from_env: String },
    FromFile { path: String },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum SecretValue {
    Literal { value: String },
    FromEnv { from_env: String },
    FromFile { path: String },
}

#[derive(Debug, Deserialize, Clone)]
pub struct SignerConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}
