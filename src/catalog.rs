//! Table id <-> (name, heap file) registry. A thin collaborator consumed
//! by the buffer pool and the scan operator; no schema inference or DDL.

use crate::heap_file::HeapFile;
use crate::types::TableId;
use std::collections::HashMap;
use std::sync::Arc;

struct Entry {
    name: String,
    file: Arc<HeapFile>,
}

pub struct Catalog {
    tables: HashMap<TableId, Entry>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog {
            tables: HashMap::new(),
        }
    }

    pub fn add_table(&mut self, file: Arc<HeapFile>, name: &str) -> TableId {
        let table_id = file.table_id();
        self.tables.insert(
            table_id,
            Entry {
                name: name.to_string(),
                file,
            },
        );
        table_id
    }

    /// `getDatabaseFile(tableId) -> heap file`.
    pub fn table(&self, table_id: TableId) -> Option<Arc<HeapFile>> {
        self.tables.get(&table_id).map(|e| Arc::clone(&e.file))
    }

    /// `getTableName(tableId) -> name`.
    pub fn table_name(&self, table_id: TableId) -> Option<&str> {
        self.tables.get(&table_id).map(|e| e.name.as_str())
    }

    /// `tableIdIterator() -> tables`.
    pub fn table_ids(&self) -> impl Iterator<Item = TableId> + '_ {
        self.tables.keys().copied()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new()
    }
}
