use crate::core::Config;
use crate::db::{LabelStore, migrate};
use crate::serial::SerialAllocator;

/// Shared application state.
///
/// Holds the configuration and the open store; `Clone` is cheap because
/// the store shares its database handle via `Arc`.
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub store: LabelStore,
}

impl ServerState {
    /// Open the store and run the one-time legacy JSON import.
    ///
    /// Creates the data directory if it does not exist. The import is
    /// idempotent (guarded by a persisted marker), so calling this on
    /// every startup is safe.
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let store = LabelStore::open(config.database_path())?;

        match migrate::import_legacy_json(&store, &config.legacy_json_path())? {
            migrate::MigrationOutcome::Imported { sessions, years } => {
                tracing::info!(sessions, years, "Imported legacy JSON records");
            }
            migrate::MigrationOutcome::NothingToImport => {
                tracing::info!("No legacy JSON document found, marked migration complete");
            }
            migrate::MigrationOutcome::AlreadyMigrated => {}
        }

        Ok(Self {
            config: config.clone(),
            store,
        })
    }

    /// Allocator façade over the store.
    pub fn allocator(&self) -> SerialAllocator {
        SerialAllocator::new(self.store.clone())
    }
}
