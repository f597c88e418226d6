use std::time::Duration;

use anyhow::{anyhow, Error, Result};
use http::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

use crate::config::settings::TransportConfig;
use crate::transport::Transport;

static SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";
static SOAP_ACTION_HEADER: &str = "SOAPAction";

/// SOAP 1.1 over HTTP: POST the envelope, return the raw response body.
#[derive(Debug, Clone)]
pub struct SoapTransport {
    client: Client,
}

impl SoapTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for SoapTransport {
    async fn send(&self, url: &str, body: &[u8]) -> Result<Vec<u8>, Error> {
        debug!("POST {} ({} bytes)", url, body.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static(SOAP_CONTENT_TYPE))
            .header(SOAP_ACTION_HEADER, HeaderValue::from_static(""))
            .body(body.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP request failed: {}", response.status()));
        }
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
