//! Free-text header normalization
//!
//! Object, filter and observer names typed by observers drift over time
//! ("m31", "Andromeda", "M 31"). Each field has its own [`NameTable`];
//! a missing table simply passes values through.

mod table;

pub use table::{NameEntry, NameTable};

use std::path::Path;

/// The three lookup tables used during a run. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub names: NameTable,
    pub filters: NameTable,
    pub observers: NameTable,
}

impl LookupTables {
    /// Load whichever tables were given. A path that does not point to a
    /// readable file is logged and leaves that table empty.
    pub fn load(
        names: Option<&Path>,
        filters: Option<&Path>,
        observers: Option<&Path>,
    ) -> Self {
        Self {
            names: load_optional(names, "names"),
            filters: load_optional(filters, "filters"),
            observers: load_optional(observers, "observers"),
        }
    }

    pub fn object_name(&self, raw: &str) -> String {
        self.names.normalize(raw)
    }

    pub fn filter(&self, raw: &str) -> String {
        self.filters.normalize(raw)
    }

    pub fn observer(&self, raw: &str) -> String {
        self.observers.normalize(raw)
    }
}

fn load_optional(path: Option<&Path>, kind: &str) -> NameTable {
    let Some(path) = path else {
        return NameTable::new();
    };

    if !path.is_file() {
        tracing::error!("No {} dict file: {}", kind, path.display());
        return NameTable::new();
    }

    match NameTable::load_from_csv(path) {
        Ok(table) => table,
        Err(e) => {
            tracing::error!("Failed to load {} dict {}: {:#}", kind, path.display(), e);
            NameTable::new()
        }
    }
}
