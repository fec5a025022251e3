//! Classdesk - command line client for the school administration API
//!
//! Wires the settings, session storage, transport and API client together
//! and runs one command. The session is kept on disk between invocations.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use classdesk_application::auth::{AuthService, TokenStore};
use classdesk_application::client::ApiClient;
use classdesk_infrastructure::{
    FileSessionStorage, ReqwestTransport, SettingsLoader, TokioFileSystem, TracingNotifier,
    WatchLoginRedirect,
};
use commands::Commands;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "classdesk")]
#[command(about = "Command line client for the Classdesk school administration API")]
#[command(version)]
struct Cli {
    /// Settings file (TOML); `CLASSDESK_*` variables override it
    #[arg(short = 'c', long, global = true, env = "CLASSDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the stored session (defaults to the platform data dir)
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut loader = SettingsLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let settings = loader.load().context("loading settings")?;

    let fs = TokioFileSystem::new();
    let storage = match &cli.data_dir {
        Some(dir) => FileSessionStorage::new(fs, dir.join(&settings.storage_namespace)),
        None => FileSessionStorage::in_data_dir(fs, &settings.storage_namespace)?,
    };
    tracing::debug!(path = %storage.root().display(), "using session storage");
    let store = Arc::new(TokenStore::rehydrate(Arc::new(storage)).await);

    let transport = Arc::new(ReqwestTransport::new(&settings)?);
    let redirect = WatchLoginRedirect::new(settings.login_redirect.clone());
    let client = ApiClient::builder(transport, store)
        .settings(settings)
        .notifier(Arc::new(TracingNotifier))
        .login_redirect(Arc::new(redirect.clone()))
        .build()?;
    let auth = AuthService::new(Arc::new(client));

    let result = cli.command.execute(&auth).await;
    if redirect.requested() {
        eprintln!("Your session has ended. Run `classdesk login` to sign in again.");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
