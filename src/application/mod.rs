//! Process-wide bootstrap: configuration, logging, and the shared handle
//! passed to the webserver and task dispatcher alike (spec §9's "single,
//! explicitly-initialised logger" exception to the no-globals rule).

pub mod config;
pub mod logging;

use std::sync::Arc;

use once_cell::sync::OnceCell;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::warn;

use crate::{error::KoditResult, queue::dispatcher::Dispatcher, search::Bm25Index};
use config::configuration::Configuration;

static LOGGER_INSTALLED: OnceCell<bool> = OnceCell::new();

#[derive(Clone)]
pub struct Application {
    pub config: Configuration,
    pub db: sqlx::SqlitePool,
    pub dispatcher: Arc<Dispatcher>,
    /// One long-lived index shared by every indexing and retrieval call site
    /// (spec §4.3): a fresh `Bm25Index` per request would only ever see an
    /// empty in-memory corpus, since only `rebuild()` populates it.
    pub bm25: Arc<Bm25Index>,
}

impl Application {
    pub async fn initialize(config: Configuration) -> KoditResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(config.clones_dir())?;

        let db = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(&config.db_url)
            .await?;
        sqlx::migrate!("./migrations").run(&db).await.map_err(|e| {
            crate::error::KoditError::Fatal(format!("migration failed: {e}"))
        })?;

        let dispatcher = Arc::new(Dispatcher::new(db.clone(), config.clone()));
        let bm25 = Arc::new(Bm25Index::open(config.bm25_index_dir())?);

        Ok(Self {
            config,
            db,
            dispatcher,
            bm25,
        })
    }

    pub fn install_logging(config: &Configuration) {
        if let Some(true) = LOGGER_INSTALLED.get() {
            return;
        }
        if !logging::tracing::tracing_subscribe(config) {
            warn!("failed to install tracing subscriber, one is probably already installed");
        }
        if color_eyre::install().is_err() {
            warn!("failed to install color-eyre, one is probably already installed");
        }
        let _ = LOGGER_INSTALLED.set(true);
    }
}
