//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST
//! API. Services are generic over the repository traits; AppState pins them
//! to the SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use botmaas_core::service::catalog::TemplateCatalog;
use botmaas_core::service::duplication::DuplicationEngine;
use botmaas_core::service::maas::BotMaasService;
use botmaas_infra::config::{load_global_config, resolve_data_dir};
use botmaas_infra::sqlite::lineage::SqliteLineageLedger;
use botmaas_infra::sqlite::pool::{DatabasePool, default_database_url};
use botmaas_infra::sqlite::space::SqliteSpaceAccess;
use botmaas_infra::sqlite::template::SqliteTemplateStore;
use botmaas_infra::sqlite::workflow::SqliteWorkflowRepository;
use botmaas_types::config::GlobalConfig;

pub type ConcreteMaasService = BotMaasService<
    SqliteTemplateStore,
    SqliteWorkflowRepository,
    SqliteLineageLedger,
    SqliteSpaceAccess,
>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConcreteMaasService>,
    /// Template authoring (import, delete, groups). Not part of the clone path.
    pub template_store: Arc<SqliteTemplateStore>,
    pub space_access: Arc<SqliteSpaceAccess>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: resolve the data dir, connect to the
    /// DB, load `config.toml`, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_pool = DatabasePool::new(&default_database_url(&data_dir)).await?;
        let config = load_global_config(&data_dir).await;

        Ok(Self::from_parts(data_dir, db_pool, config))
    }

    pub fn from_parts(data_dir: PathBuf, db_pool: DatabasePool, config: GlobalConfig) -> Self {
        let catalog = TemplateCatalog::new(
            SqliteTemplateStore::new(db_pool.clone()),
            SqliteWorkflowRepository::new(db_pool.clone()),
        );
        let ledger =
            SqliteLineageLedger::new(db_pool.clone()).with_page_size(config.lineage.page_size);
        let engine = DuplicationEngine::new(catalog, ledger, SqliteSpaceAccess::new(db_pool.clone()));

        tracing::debug!(
            data_dir = %data_dir.display(),
            max_parallel_targets = config.mass_copy.max_parallel_targets,
            "application state initialized"
        );

        Self {
            service: Arc::new(BotMaasService::new(engine, config)),
            template_store: Arc::new(SqliteTemplateStore::new(db_pool.clone())),
            space_access: Arc::new(SqliteSpaceAccess::new(db_pool.clone())),
            data_dir,
            db_pool,
        }
    }
}
