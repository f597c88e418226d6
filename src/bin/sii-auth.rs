use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use sii_auth::auth::{Authenticator, Credential};
use sii_auth::helpers::time::now_rfc3339;
use sii_auth::observability::metrics::get_metrics;
use sii_auth::resilience::retry::RetrySettings;
use sii_auth::signer::CommandSigner;
use sii_auth::transport::SoapTransport;
use sii_auth::utils::config_loader;
use sii_auth::utils::logging::{self, LogLevel};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "sii-auth.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// overrides `environment` from the config file
    #[arg(short, long)]
    environment: Option<String>,
    #[arg(short, long, value_enum, default_value = "plain")]
    output: OutputFormat,
    /// write prometheus text metrics here after the run
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level);

    let environment = service_config.resolve_environment(args.environment.as_deref());

    // -------------------------------
    // 2. Build collaborators
    // -------------------------------

    let credential = Credential::from_config(&service_config.credential).await?;
    let transport = SoapTransport::new(&service_config.settings.transport)?;
    let signer = CommandSigner::from_config(&service_config.signer);
    let retry = service_config
        .settings
        .retry
        .as_ref()
        .map(RetrySettings::from)
        .unwrap_or_default();

    let authenticator = Authenticator::new(
        transport,
        signer,
        service_config.endpoints.clone(),
        service_config.templates.clone(),
        retry,
    );

    // -------------------------------
    // 3. Authenticate, Ctrl-C cancels
    // -------------------------------

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling authentication");
            on_signal.cancel();
        }
    });

    let result = authenticator
        .authenticate_with_cancel(&credential, environment, &cancel)
        .await;

    // -------------------------------
    // 4. Metrics text file
    // -------------------------------

    let metrics_path = args.metrics_out.or_else(|| {
        let metrics = &service_config.settings.metrics;
        match metrics.is_enabled {
            true => metrics.path.as_ref().map(PathBuf::from),
            false => None,
        }
    });
    if let Some(path) = metrics_path {
        let text = get_metrics().await.render_text()?;
        tokio::fs::write(&path, text)
            .await
            .with_context(|| format!("writing metrics to '{}'", path.display()))?;
        info!("metrics written to '{}'", path.display());
    }

    let token = result?;
    match args.output {
        OutputFormat::Plain => println!("{}", token),
        OutputFormat::Json => println!(
            "{}",
            json!({
                "token": token,
                "environment": environment.as_str(),
                "obtained_at": now_rfc3339(),
            })
        ),
    }

    Ok(())
}
