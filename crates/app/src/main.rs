//! Tally - command line entry point.
//!
//! Logs in with the `token` parameter of the launch URL or, without one,
//! with Telegram init data, then prints the budgeting overview.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tally_application::ports::{CloudStorage, KeyValueStore};
use tally_application::use_cases::{LoadOverview, Navigate};
use tally_application::{
    ApiClient, AppStorage, AuthService, ClientConfig, ThemeStorage, TokenStorage,
};
use tally_domain::{LoginCredential, Route};
use tally_infrastructure::storage::config_dir;
use tally_infrastructure::{
    DisabledCloudStorage, FileKeyValueStore, KeyValueCloudStorage, MemoryKeyValueStore,
    ReqwestHttpClient, RouteTracker, default_config_path, init_tracing, load_config,
};
use tracing::Instrument;
use url::Url;

/// File backing the cloud storage mirror.
const CLOUD_STORE_FILE: &str = "cloud-storage.json";

/// Command line client of the Tally budgeting Mini App.
#[derive(Parser, Debug)]
#[command(name = "tally", version)]
struct Args {
    /// Config file; defaults to `config.toml` in the platform config dir.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Telegram init data to log in with.
    #[arg(long, env = "TALLY_INIT_DATA", hide_env_values = true)]
    init_data: Option<String>,

    /// WebApp platform version; cloud storage is mirrored from 6.1 on.
    #[arg(long, env = "TALLY_PLATFORM_VERSION")]
    platform_version: Option<String>,

    /// Launch URL; its `token` parameter wins over init data.
    launch_url: Option<Url>,
}

impl Args {
    /// Picks the login credential: a launch URL token wins over init data.
    fn credential(&self) -> Option<LoginCredential> {
        if let Some(url) = &self.launch_url
            && let Some(credential) = LoginCredential::from_url(url)
        {
            tracing::debug!(
                url = %LoginCredential::strip_from_url(url),
                "Using launch URL token"
            );
            return Some(credential);
        }

        self.init_data
            .clone()
            .filter(|data| !data.is_empty())
            .map(LoginCredential::InitData)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config_path = args.config.clone().or_else(default_config_path);
    let config = load_config(config_path.as_deref())?;

    let span = init_tracing(&config.logger);
    span.in_scope(|| {
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            api = %config.api_base_url,
            "Starting Tally"
        );
    });

    run(&config, &args).instrument(span).await
}

async fn run(config: &ClientConfig, args: &Args) -> Result<(), Box<dyn Error>> {
    let local: Arc<dyn KeyValueStore> = match FileKeyValueStore::open_default() {
        Some(store) => {
            tracing::debug!(path = %store.path().display(), "Using file storage");
            Arc::new(store)
        }
        None => {
            tracing::warn!("No config directory, settings will not persist");
            Arc::new(MemoryKeyValueStore::new())
        }
    };
    let storage = Arc::new(AppStorage::load(local));

    let theme = ThemeStorage::new(Arc::clone(&storage)).initialize(false);
    tracing::debug!(theme = theme.as_str(), "Theme resolved");

    let tokens = TokenStorage::new(storage, cloud_storage(args.platform_version.as_deref()));
    let navigator = Arc::new(RouteTracker::default());
    let http = Arc::new(ReqwestHttpClient::from_config(config)?);
    let auth = AuthService::new(
        http.clone(),
        tokens,
        navigator.clone(),
        config.auth_settings(),
    );
    auth.set_credential(args.credential());

    if let Err(error) = auth.initialize().await {
        tracing::error!(%error, route = navigator.current().path(), "Authentication failed");
        return Err(error.into());
    }

    let route = Navigate::new(auth.clone(), navigator).execute(Route::Budgeting);
    if route != Route::Budgeting {
        return Err(format!("redirected to {}", route.path()).into());
    }

    let api = ApiClient::new(http, auth.clone());
    let output = LoadOverview::new(api).execute().await?;
    auth.stop_refresh_timer();

    let overview = &output.overview;
    println!(
        "Month {}: income {:.2} {currency}, spending {:.2} {currency}, balance {:.2} {currency}",
        overview.month,
        overview.month_income,
        overview.month_spending,
        overview.month_balance,
        currency = overview.currency,
    );

    let (top, rest) = output.split_ranking();
    for share in top {
        println!("  {:<20} {:>10.2} {:>5.1}%", share.name, share.value, share.percentage);
    }
    if !rest.is_empty() {
        println!("  ... and {} more", rest.len());
    }

    Ok(())
}

/// Builds the cloud mirror for the reported platform version.
fn cloud_storage(platform_version: Option<&str>) -> Arc<dyn CloudStorage> {
    let Some(version) = platform_version else {
        return Arc::new(DisabledCloudStorage);
    };

    match config_dir() {
        Some(dir) => {
            let store = FileKeyValueStore::open(dir.join(CLOUD_STORE_FILE));
            Arc::new(KeyValueCloudStorage::new(Arc::new(store), version))
        }
        None => Arc::new(DisabledCloudStorage),
    }
}
