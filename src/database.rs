//! Process-wide wiring: the single `Database::global()` registry binds the
//! catalog, lock manager, buffer pool and recovery log together, mirroring
//! the teacher's `OnceCell`-backed singleton but replacing the bare
//! `PAGE_SIZE` static with a `DbConfig` the registry is built from.

use crate::buffer_pool::BufferPool;
use crate::catalog::Catalog;
use crate::heap_file::HeapFile;
use crate::lock_manager::LockManager;
use crate::recovery_log::{NoOpLog, RecoveryLog};
use crate::types::TableId;
use once_cell::sync::OnceCell;
use std::sync::{Arc, RwLock};
use std::time::Duration;

static DB: OnceCell<Database> = OnceCell::new();

/// Tunables that used to be hardcoded statics in the teacher's codebase.
/// Grouped here so tests can build an isolated `Database` instead of
/// depending on mutable global state.
#[derive(Debug, Clone, Copy)]
pub struct DbConfig {
    pub page_size: usize,
    pub buffer_pool_capacity: usize,
    pub string_field_len: usize,
    pub lock_wait_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            page_size: 4096,
            buffer_pool_capacity: 64,
            string_field_len: crate::field::DEFAULT_STRING_LEN,
            lock_wait_timeout: Duration::from_millis(1000),
        }
    }
}

pub struct Database {
    config: DbConfig,
    catalog: Arc<RwLock<Catalog>>,
    lock_manager: Arc<LockManager>,
    buffer_pool: Arc<BufferPool>,
    log: Arc<dyn RecoveryLog>,
}

impl Database {
    fn new(config: DbConfig, log: Arc<dyn RecoveryLog>) -> Database {
        let catalog = Arc::new(RwLock::new(Catalog::new()));
        let lock_manager = Arc::new(LockManager::with_timeout(config.lock_wait_timeout));
        let buffer_pool = Arc::new(BufferPool::new(
            config.buffer_pool_capacity,
            Arc::clone(&lock_manager),
            Arc::clone(&catalog),
            Arc::clone(&log),
        ));
        Database {
            config,
            catalog,
            lock_manager,
            buffer_pool,
            log,
        }
    }

    /// The process-wide instance, lazily built with default config on
    /// first access. Tests that need a specific config should construct
    /// a `Database` directly rather than going through `global()`.
    pub fn global() -> &'static Database {
        DB.get_or_init(|| Database::new(DbConfig::default(), Arc::new(NoOpLog)))
    }

    pub fn config(&self) -> DbConfig {
        self.config
    }

    pub fn catalog(&self) -> &RwLock<Catalog> {
        &self.catalog
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn log(&self) -> &dyn RecoveryLog {
        self.log.as_ref()
    }

    pub fn add_table(&self, file: Arc<HeapFile>, name: &str) -> TableId {
        self.catalog.write().unwrap().add_table(file, name)
    }
}
