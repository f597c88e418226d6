use anyhow::{anyhow, bail};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::auth::credential::Credential;
use crate::auth::stage::Stage;
use crate::config::service::{EndpointPair, EndpointsConfig, Environment, TemplatesConfig};
use crate::error::{AuthError, AuthResult};
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::parser::envelope::extract_return;
use crate::parser::fragment::find_element_text;
use crate::parser::template::substitute_first;
use crate::resilience::retry::{RetryError, RetrySettings};
use crate::resilience::unavailable::is_service_unavailable;
use crate::signer::Signer;
use crate::transport::Transport;
use crate::utils::constants::{SEED_PLACEHOLDER, SIGNED_PLACEHOLDER};

static TRANSPORT_REASON: &str = "transport";
static UNAVAILABLE_REASON: &str = "unavailable";

/// Seed → sign → token login against the SII web services.
///
/// Holds only immutable configuration and the two collaborators; every
/// request body, response and intermediate value lives inside a single
/// call, so one `Authenticator` can serve concurrent logins.
#[derive(Debug, Clone)]
pub struct Authenticator<T, S> {
    transport: T,
    signer: S,
    endpoints: EndpointsConfig,
    templates: TemplatesConfig,
    retry: RetrySettings,
}

impl<T, S> Authenticator<T, S>
where
    T: Transport + Sync,
    S: Signer + Sync,
{
    pub fn new(
        transport: T,
        signer: S,
        endpoints: EndpointsConfig,
        templates: TemplatesConfig,
        retry: RetrySettings,
    ) -> Self {
        Self { transport, signer, endpoints, templates, retry }
    }

    /// Obtain a token. Either a non-empty token or an error, never both.
    pub async fn authenticate(&self, credential: &Credential, environment: Environment) -> AuthResult<String> {
        self.authenticate_with_cancel(credential, environment, &CancellationToken::new())
            .await
    }

    /// Same as [`Authenticator::authenticate`], aborting with
    /// [`AuthError::Cancelled`] as soon as `cancel` fires.
    pub async fn authenticate_with_cancel(
        &self,
        credential: &Credential,
        environment: Environment,
        cancel: &CancellationToken,
    ) -> AuthResult<String> {
        let metrics = get_metrics().await;
        let endpoints = self.endpoints.for_environment(environment);
        info!(environment = %environment, "authentication started");

        let result = self.login(credential, endpoints, cancel).await;
        match &result {
            Ok(_) => {
                metrics.auth_success.inc();
                info!(environment = %environment, "token obtained");
            }
            Err(err) => {
                metrics.auth_failures.with_label_values(&[err.reason()]).inc();
                error!(stage = %err.stage(), reason = err.reason(), error = %err, "authentication failed");
            }
        }
        result
    }

    async fn login(&self, credential: &Credential, endpoints: &EndpointPair, cancel: &CancellationToken) -> AuthResult<String> {
        // -------------------------------
        // 1. Seed
        // -------------------------------

        let seed_request = self.templates.seed_request.trim();
        let seed = self
            .exchange(Stage::Seed, &endpoints.seed_url, seed_request.as_bytes(), cancel)
            .await?;
        debug!("seed received: {}", seed);

        let signed = self.sign_seed(credential, &seed, cancel).await?;

        // -------------------------------
        // 2. Token
        // -------------------------------

        let token_request = substitute_first(&self.templates.token_request, SIGNED_PLACEHOLDER, &signed);
        self.exchange(Stage::Token, &endpoints.token_url, token_request.trim().as_bytes(), cancel)
            .await
    }

    async fn sign_seed(&self, credential: &Credential, seed: &str, cancel: &CancellationToken) -> AuthResult<String> {
        let metrics = get_metrics().await;
        let document = substitute_first(&self.templates.signing_request, SEED_PLACEHOLDER, seed);
        let start = get_instant();

        let signed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AuthError::Cancelled { stage: Stage::Seed }),
            signed = self.signer.sign(&credential.certificate_base64, &credential.password, &document) => signed,
        };
        let outcome = if signed.is_ok() { "ok" } else { "error" };
        metrics.sign_duration.with_label_values(&[outcome]).observe(start.elapsed().as_secs_f64());

        let signed = signed.map_err(AuthError::Signing)?;
        String::from_utf8(signed)
            .map_err(|e| AuthError::Signing(anyhow!("signed document is not valid UTF-8: {}", e)))
    }

    /// One stage: send with retries, then unwrap envelope and fragment.
    async fn exchange(&self, stage: Stage, url: &str, body: &[u8], cancel: &CancellationToken) -> AuthResult<String> {
        let metrics = get_metrics().await;
        let start = get_instant();
        info!("requesting {} from '{}'", stage, url);

        let result = match self.send_with_retry(stage, url, body, cancel).await {
            Ok(response) => read_value(stage, &response),
            Err(err) => Err(err),
        };

        metrics.stage_duration.with_label_values(&[stage.as_str()]).observe(start.elapsed().as_secs_f64());
        match &result {
            Ok(_) => info!("{} stage completed", stage),
            Err(err) => metrics.stage_failures.with_label_values(&[stage.as_str(), err.reason()]).inc(),
        }
        result
    }

    async fn send_with_retry(&self, stage: Stage, url: &str, body: &[u8], cancel: &CancellationToken) -> AuthResult<Vec<u8>> {
        let metrics = get_metrics().await;
        self.retry
            .run_with_retry(cancel, |attempt| async move {
                metrics.stage_requests.with_label_values(&[stage.as_str()]).inc();
                debug!("{} attempt {}", stage, attempt);

                let response = self.transport.send(url, body).await.inspect_err(|_| {
                    metrics.stage_failed_attempts.with_label_values(&[stage.as_str(), TRANSPORT_REASON]).inc();
                })?;
                if is_service_unavailable(&response) {
                    metrics.stage_failed_attempts.with_label_values(&[stage.as_str(), UNAVAILABLE_REASON]).inc();
                    bail!("503 Service Unavailable");
                }
                Ok::<_, anyhow::Error>(response)
            })
            .await
            .map_err(|err| match err {
                RetryError::Exhausted { attempts, last } => AuthError::ServiceUnavailable { stage, attempts, source: last },
                RetryError::Cancelled => AuthError::Cancelled { stage },
            })
    }
}

/// Envelope → escaped fragment → leaf text. Nothing here is retried.
fn read_value(stage: Stage, response: &[u8]) -> AuthResult<String> {
    let element = stage.leaf_element();
    let fragment = extract_return(response, stage)
        .map_err(|source| AuthError::EnvelopeParse { stage, source })?;
    let value = find_element_text(&fragment, element)
        .map_err(|source| AuthError::FragmentParse { stage, source })?
        .ok_or(AuthError::ElementNotFound { stage, element })?;

    if value.trim().is_empty() {
        return Err(AuthError::EmptyValue { stage, element });
    }
    Ok(value)
}
