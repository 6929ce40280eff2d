#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

use std::path::PathBuf;
use std::sync::Arc;

use envconfig::Envconfig;

pub mod data;
pub mod graphql;
mod handlers;
mod poll;
mod server;

use data::DatasetStore;
use graphql::{create_schema, GraphQLSchema};

const DEFAULT_LOG_FILTER: &str = "geoql=info,actix_web=info";

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(from = "GEOQL_ENV", default = "dev")]
    pub env: String,

    #[envconfig(from = "GEOQL_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "GEOQL_PORT", default = "4000")]
    pub port: u16,

    #[envconfig(from = "GEOQL_DATA_DIR", default = "data")]
    pub data_dir: PathBuf,

    /// Write mutations back to the JSON files in `data_dir`.
    #[envconfig(from = "GEOQL_PERSIST", default = "false")]
    pub persist: bool,

    #[envconfig(from = "GEOQL_FLUSH_SECS", default = "5")]
    pub flush_secs: u64,
}

impl Config {
    pub fn is_dev(&self) -> bool {
        self.env == "dev"
    }
}

#[derive(Clone)]
pub struct AppState {
    config: Config,
    store: Arc<DatasetStore>,
    schema: GraphQLSchema,
}

impl AppState {
    pub fn new(config: Config, store: DatasetStore) -> Self {
        let store = Arc::new(store);
        Self {
            schema: create_schema(store.clone()),
            config,
            store,
        }
    }

    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }
}

pub fn init_env() -> anyhow::Result<AppState> {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&filters)
        .try_init()?;

    let config = Config::init_from_env()?;
    if config.persist && config.is_dev() {
        warn!(
            "persistence enabled in dev; mutations will rewrite {}",
            config.data_dir.display()
        );
    }

    let store = DatasetStore::open(&config.data_dir, config.persist)?;
    Ok(AppState::new(config, store))
}

pub async fn run_server(app_state: &AppState) -> anyhow::Result<()> {
    poll::start(app_state)?;
    server::run(app_state).await?;

    // the flush task dies with the runtime; write anything it hadn't yet
    if app_state.store.flush()? {
        info!("flushed pending changes on shutdown");
    }
    Ok(())
}
