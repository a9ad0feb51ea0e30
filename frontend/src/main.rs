//! Command-line entry point: loads settings, wires the HTTP client and runs
//! one flow.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

use frontend::config::ClientSettings;
use frontend::inbound::cli::{Cli, CliContext, LogFormat, execute};
use frontend::outbound::http::HttpApiClient;
use frontend::outbound::sleeper::TokioSleeper;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut settings = ClientSettings::load_from_iter([OsString::from("frontend")])
        .map_err(|error| eyre!("failed to load client settings: {error}"))?;
    if let Some(base) = cli.api_base_url {
        settings.api_base_url = Some(base);
    }
    let base_url: Url = settings.api_base_url()?;
    debug!(%base_url, "using backend");

    let client = HttpApiClient::new(base_url.clone(), settings.request_timeout())
        .wrap_err("failed to build HTTP client")?;
    let ctx = CliContext {
        api: Arc::new(client),
        sleeper: Arc::new(TokioSleeper),
        policy: settings.probe_retry_policy(),
        base_url,
    };

    let mut stdout = io::stdout().lock();
    let succeeded = execute(cli.command, &ctx, &mut stdout)
        .await
        .wrap_err("failed to write command output")?;
    stdout.flush()?;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(format: LogFormat) {
    let builder = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}
