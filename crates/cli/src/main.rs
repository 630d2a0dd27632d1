//! `searchctl` entry point.
//!
//! Composition root: parses arguments, wires observability, builds the
//! client configuration (flags override the environment), connects the
//! `reqwest` transport and runs exactly one command.

mod commands;
mod telemetry;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use commands::Command;
use search::config::{ENV_API_VERSION, ENV_KEY, ENV_URL};
use search::ClientConfig;

#[derive(Debug, Parser)]
#[command(name = "searchctl", version)]
#[command(about = "Manage indexes, indexers and documents of a search service", long_about = None)]
struct Cli {
    /// Service URL, e.g. https://my-service.search.windows.net
    #[arg(long, env = ENV_URL, global = true)]
    url: Option<String>,

    /// Service admin or query key
    #[arg(long, env = ENV_KEY, global = true, hide_env_values = true)]
    key: Option<String>,

    /// REST API version tag (YYYY-MM-DD[-Preview])
    #[arg(long, env = ENV_API_VERSION, global = true)]
    api_version: Option<String>,

    /// Give up on the request after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut builder = ClientConfig::builder(
            self.url.clone().unwrap_or_default(),
            self.key.clone().unwrap_or_default(),
        );
        if let Some(version) = &self.api_version {
            builder = builder.version(version.clone());
        }
        Ok(builder.build()?)
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.client_config()?;
    info!(url = %config.url(), api_version = %config.version(), "connecting");
    let client = search_http::connect(config)?;

    let name = cli.command.name();
    let work = commands::execute(&client, cli.command);
    let output = match cli.timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), work)
            .await
            .with_context(|| format!("{name} timed out after {secs}s"))??,
        None => work.await?,
    };

    if let Some(value) = output {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    info!(command = name, "done");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let telemetry = match telemetry::init(cli.verbose, cli.log_json) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(cli).await;
    let code = match &result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_build_the_client_config() {
        let cli = Cli::try_parse_from([
            "searchctl",
            "--url",
            "https://svc.search.windows.net",
            "--key",
            "k",
            "--api-version",
            "2017-11-11",
            "count",
            "hotels",
        ])
        .unwrap();
        let config = cli.client_config().unwrap();
        assert_eq!(config.version().as_str(), "2017-11-11");
        assert_eq!(config.origin(), "https://svc.search.windows.net:443");
    }

    #[test]
    fn index_docs_parses_kebab_case_action() {
        let cli = Cli::try_parse_from([
            "searchctl",
            "index-docs",
            "hotels",
            "docs.json",
            "--action",
            "merge-or-upload",
        ])
        .unwrap();
        match cli.command {
            Command::IndexDocs { action, .. } => {
                assert_eq!(action, commands::ActionArg::MergeOrUpload)
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn missing_url_is_reported_before_connecting() {
        let cli = Cli {
            url: None,
            key: Some("k".into()),
            api_version: None,
            timeout_secs: None,
            verbose: 0,
            log_json: false,
            command: Command::Count {
                index: "hotels".into(),
            },
        };
        let err = cli.client_config().unwrap_err();
        assert!(err.to_string().contains("url"));
    }
}
