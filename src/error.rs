//! Error types for the authentication flow.
//!
//! Collaborators (transport, signer) report failures as [`anyhow::Error`];
//! the authenticator classifies them into [`AuthError`] so callers can tell
//! a retry-exhausted service apart from a malformed response.

use thiserror::Error;

use crate::auth::stage::Stage;

/// Result type alias for authentication operations.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// XML problems found while unwrapping a response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// The reader rejected the document (syntax, mismatched tags, bad escapes).
    #[error("malformed xml at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// Input ended while an element was still open.
    #[error("unexpected end of document, {open} element(s) still open")]
    UnexpectedEof { open: usize },

    /// Input has no root element at all.
    #[error("document has no root element")]
    NoRoot,
}

/// Failures of a single `authenticate` call.
///
/// Only [`AuthError::ServiceUnavailable`] is the product of retries; every
/// other variant aborts the attempt at the first occurrence.
#[must_use = "errors should be handled or propagated"]
#[derive(Debug, Error)]
pub enum AuthError {
    /// Transport failed, or kept answering with the "503" signature, for every attempt.
    #[error("{stage} service unavailable after {attempts} attempt(s): {source}")]
    ServiceUnavailable {
        stage: Stage,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },

    /// The outer SOAP envelope could not be parsed.
    #[error("{stage} envelope could not be parsed: {source}")]
    EnvelopeParse {
        stage: Stage,
        #[source]
        source: XmlError,
    },

    /// The XML document embedded in the envelope could not be parsed.
    #[error("{stage} response fragment could not be parsed: {source}")]
    FragmentParse {
        stage: Stage,
        #[source]
        source: XmlError,
    },

    #[error("{stage} response has no <{element}> element")]
    ElementNotFound { stage: Stage, element: &'static str },

    #[error("{stage} response has an empty <{element}> element")]
    EmptyValue { stage: Stage, element: &'static str },

    /// Signer failure, reported as the signer produced it.
    #[error(transparent)]
    Signing(anyhow::Error),

    #[error("{stage} stage cancelled")]
    Cancelled { stage: Stage },
}

impl AuthError {
    /// Stable label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::ServiceUnavailable { .. } => "service_unavailable",
            AuthError::EnvelopeParse { .. } => "envelope_parse",
            AuthError::FragmentParse { .. } => "fragment_parse",
            AuthError::ElementNotFound { .. } => "element_not_found",
            AuthError::EmptyValue { .. } => "empty_value",
            AuthError::Signing(_) => "signing",
            AuthError::Cancelled { .. } => "cancelled",
        }
    }

    /// Stage the failure belongs to. Signing happens between the two
    /// exchanges and is reported as part of the seed stage.
    pub fn stage(&self) -> Stage {
        match self {
            AuthError::ServiceUnavailable { stage, .. }
            | AuthError::EnvelopeParse { stage, .. }
            | AuthError::FragmentParse { stage, .. }
            | AuthError::ElementNotFound { stage, .. }
            | AuthError::EmptyValue { stage, .. }
            | AuthError::Cancelled { stage } => *stage,
            AuthError::Signing(_) => Stage::Seed,
        }
    }
}
