//! Canonical name lookup table
//!
//! Loaded from a headerless CSV file: the first column is the canonical
//! name, the remaining columns are aliases. Aliases are upper-cased on load.

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// One canonical name with its known aliases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub canonical: String,
    pub aliases: HashSet<String>,
}

/// Canonical name -> alias set, iterated in file order
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    entries: Vec<NameEntry>,
    index: HashMap<String, usize>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a CSV file
    pub fn load_from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read lookup table: {}", path.display()))?;

        let table = Self::parse_csv(&content)?;
        tracing::info!(
            "Loaded {} canonical names from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse CSV content
    pub fn parse_csv(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut table = Self::new();
        for (row_number, result) in reader.records().enumerate() {
            let record = result.context(format!("Malformed lookup table row {}", row_number + 1))?;

            let mut cells = record.iter().filter(|cell| !cell.is_empty());
            let Some(canonical) = cells.next() else {
                continue;
            };
            let aliases = cells.map(|alias| alias.to_uppercase()).collect();
            table.insert(canonical.to_string(), aliases);
        }

        Ok(table)
    }

    /// Insert or replace an entry. A replaced entry keeps its original position.
    pub fn insert(&mut self, canonical: String, aliases: HashSet<String>) {
        match self.index.get(&canonical) {
            Some(&position) => self.entries[position].aliases = aliases,
            None => {
                self.index.insert(canonical.clone(), self.entries.len());
                self.entries.push(NameEntry { canonical, aliases });
            }
        }
    }

    pub fn contains_key(&self, canonical: &str) -> bool {
        self.index.contains_key(canonical)
    }

    /// Map a raw header value to its canonical name.
    ///
    /// 1. the trimmed value, or its upper-cased form, is a canonical key
    /// 2. the upper-cased value is an alias; the first entry in file order wins
    /// 3. otherwise the trimmed value itself
    pub fn normalize(&self, raw: &str) -> String {
        let name = raw.trim();
        if self.contains_key(name) {
            return name.to_string();
        }

        let name_upper = name.to_uppercase();
        if self.contains_key(&name_upper) {
            return name_upper;
        }

        self.entries
            .iter()
            .find(|entry| entry.aliases.contains(&name_upper))
            .map(|entry| entry.canonical.clone())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn entries(&self) -> &[NameEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
