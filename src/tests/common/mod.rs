// tests/common/mod.rs
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Error};

use crate::auth::{Authenticator, Credential};
use crate::config::service::{EndpointPair, EndpointsConfig, TemplatesConfig};
use crate::resilience::retry::RetrySettings;
use crate::signer::Signer;
use crate::transport::Transport;

pub const CERT_SEED: &str = "https://cert.test/DTEWS/CrSeed.jws";
pub const CERT_TOKEN: &str = "https://cert.test/DTEWS/GetTokenFromSeed.jws";
pub const PROD_SEED: &str = "https://prod.test/DTEWS/CrSeed.jws";
pub const PROD_TOKEN: &str = "https://prod.test/DTEWS/GetTokenFromSeed.jws";

pub const SEED: &str = "012345678901";
pub const TOKEN: &str = "Q1W2E3R4T6Y7U";

/// What the scripted transport answers for one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Body(String),
    Fail(String),
    /// never completes
    Hang,
}

/// Transport answering from per-URL queues and recording every call.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, url: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_owned())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn push_n(&self, url: &str, reply: Reply, n: usize) -> &Self {
        for _ in 0..n {
            self.push(url, reply.clone());
        }
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(u, _)| u == url).count()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, url: &str, body: &[u8]) -> Result<Vec<u8>, Error> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_owned(), String::from_utf8_lossy(body).into_owned()));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());
        match reply {
            Some(Reply::Body(body)) => Ok(body.into_bytes()),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(anyhow!("no scripted reply for {}", url)),
        }
    }
}

/// Signer wrapping the document in `<Signed>` and remembering its inputs.
#[derive(Debug, Default)]
pub struct CapturingSigner {
    pub fail_with: Option<String>,
    /// never completes
    pub hang: bool,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl CapturingSigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self { fail_with: Some(message.to_owned()), ..Self::default() }
    }

    pub fn hanging() -> Self {
        Self { hang: true, ..Self::default() }
    }

    /// (certificate, password, document) per call
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Signer for CapturingSigner {
    async fn sign(&self, certificate_base64: &str, password: &str, document: &str) -> Result<Vec<u8>, Error> {
        self.calls.lock().unwrap().push((
            certificate_base64.to_owned(),
            password.to_owned(),
            document.to_owned(),
        ));
        if self.hang {
            return std::future::pending().await;
        }
        match &self.fail_with {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(signed(document).into_bytes()),
        }
    }
}

/// In-memory log sink for asserting on emitted events.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber and return its output with the logs.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .without_time()
        .with_writer(move || writer.clone())
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, buffer.contents())
}

pub fn signed(document: &str) -> String {
    format!("<Signed>{}</Signed>", document)
}

pub fn endpoints() -> EndpointsConfig {
    EndpointsConfig {
        certification: EndpointPair { seed_url: CERT_SEED.to_owned(), token_url: CERT_TOKEN.to_owned() },
        production: EndpointPair { seed_url: PROD_SEED.to_owned(), token_url: PROD_TOKEN.to_owned() },
    }
}

pub fn credential() -> Credential {
    Credential::new("TUlJQ2VqQ0NBZU9nQXdJQkFnSUJBVEFOQmdr", "s3cret")
}

pub fn authenticator<'a>(
    transport: &'a ScriptedTransport,
    signer: &'a CapturingSigner,
) -> Authenticator<&'a ScriptedTransport, &'a CapturingSigner> {
    Authenticator::new(
        transport,
        signer,
        endpoints(),
        TemplatesConfig::default(),
        RetrySettings { attempts: 10, base_delay_ms: 0, max_delay_ms: 0 },
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Service-shaped envelope carrying `fragment` escaped in the return field.
pub fn envelope(response: &str, field: &str, fragment: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
 <soapenv:Body>
  <ns1:{response} soapenv:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/" xmlns:ns1="http://DefaultNamespace">
   <{field} xsi:type="xsd:string">{escaped}</{field}>
  </ns1:{response}>
 </soapenv:Body>
</soapenv:Envelope>"#,
        escaped = escape(fragment),
    )
}

pub fn seed_response(seed: &str) -> String {
    envelope(
        "getSeedResponse",
        "getSeedReturn",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><SII:RESPUESTA xmlns:SII="http://www.sii.cl/XMLSchema"><SII:RESP_BODY><SEMILLA>{seed}</SEMILLA></SII:RESP_BODY><SII:RESP_HDR><ESTADO>00</ESTADO></SII:RESP_HDR></SII:RESPUESTA>"#
        ),
    )
}

pub fn token_response(token: &str) -> String {
    envelope(
        "getTokenResponse",
        "getTokenReturn",
        &format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><SII:RESPUESTA xmlns:SII="http://www.sii.cl/XMLSchema"><SII:RESP_BODY><TOKEN>{token}</TOKEN></SII:RESP_BODY><SII:RESP_HDR><ESTADO>00</ESTADO><GLOSA>Token Creado</GLOSA></SII:RESP_HDR></SII:RESPUESTA>"#
        ),
    )
}

pub fn token_response_without_token() -> String {
    envelope(
        "getTokenResponse",
        "getTokenReturn",
        r#"<?xml version="1.0" encoding="UTF-8"?><SII:RESPUESTA xmlns:SII="http://www.sii.cl/XMLSchema"><SII:RESP_HDR><ESTADO>-07</ESTADO><GLOSA>Firma del Token no esta OK</GLOSA></SII:RESP_HDR></SII:RESPUESTA>"#,
    )
}
