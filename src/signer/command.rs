use std::io::ErrorKind;
use std::process::Stdio;

use anyhow::{anyhow, bail, Context, Error};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::config::service::SignerConfig;
use crate::signer::Signer;
use crate::utils::constants::{SIGNER_CERTIFICATE_ENV, SIGNER_PASSWORD_ENV};

/// Signs by running an external program.
///
/// The document goes to the program's stdin, the certificate and password
/// through `SII_CERTIFICATE_BASE64` / `SII_CERTIFICATE_PASSWORD`, and the
/// signed document is read back from stdout. The child is killed if the
/// signing future is dropped.
#[derive(Debug, Clone)]
pub struct CommandSigner {
    program: String,
    args: Vec<String>,
}

impl CommandSigner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    pub fn from_config(config: &SignerConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

impl Signer for CommandSigner {
    async fn sign(&self, certificate_base64: &str, password: &str, document: &str) -> Result<Vec<u8>, Error> {
        debug!("signing {} bytes with '{}'", document.len(), self.program);
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(SIGNER_CERTIFICATE_ENV, certificate_base64)
            .env(SIGNER_PASSWORD_ENV, password)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start signer '{}'", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("signer '{}' has no stdin", self.program))?;
        let input = document.as_bytes().to_vec();
        let writer = async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        };

        let (written, output) = tokio::join!(writer, child.wait_with_output());
        let output = output.with_context(|| format!("signer '{}' failed to run", self.program))?;

        if !output.status.success() {
            bail!(
                "signer '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        // a successful signer may exit without draining stdin
        match written {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                debug!("signer '{}' closed stdin before reading the whole document", self.program);
            }
            other => other.with_context(|| format!("writing document to signer '{}'", self.program))?,
        }
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            bail!("signer '{}' produced no output", self.program);
        }
        Ok(output.stdout)
    }
}
