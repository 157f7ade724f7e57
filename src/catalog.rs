//! Barcode cataloging: where sample-barcode records end up.
//!
//! The pipeline does not know or care how records are persisted — it pushes
//! [`CatalogEntry`] values through the [`BarcodeCatalog`] trait and moves on.
//! The shipped implementation appends JSON lines to an environment-selected
//! file; tests use [`MemoryCatalog`] to observe exactly what the engine
//! forwarded.

use crate::config::Environment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// A catalog write failed. The caller logs it and keeps going; one bad record
/// never blocks the rest.
#[derive(Debug, Clone, Error)]
#[error("catalog write failed: {0}")]
pub struct CatalogError(pub String);

/// One persisted sample-barcode record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Canonical (normalised) barcode.
    pub barcode: String,
    /// When the page carrying the barcode was processed.
    pub processed_on: DateTime<Utc>,
    /// Output document location, relative to the processed root so stored
    /// references survive a relocation of the root.
    pub stored_location: String,
}

/// Persists sample-barcode records.
pub trait BarcodeCatalog: Send + Sync {
    fn store(&self, entry: &CatalogEntry) -> Result<(), CatalogError>;
}

/// Append-only JSON-lines catalog, one file per environment.
pub struct JsonlCatalog {
    path: PathBuf,
}

impl JsonlCatalog {
    /// Catalog file for the given environment inside `folder`:
    /// `barcodes-{env}.jsonl`.
    pub fn for_environment(folder: &Path, environment: Environment) -> Self {
        Self {
            path: folder.join(format!("barcodes-{environment}.jsonl")),
        }
    }

    /// Catalog file at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Where this catalog writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BarcodeCatalog for JsonlCatalog {
    fn store(&self, entry: &CatalogEntry) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CatalogError(format!("creating {}: {e}", parent.display())))?;
        }
        let line = serde_json::to_string(entry).map_err(|e| CatalogError(e.to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CatalogError(format!("opening {}: {e}", self.path.display())))?;
        writeln!(file, "{line}").map_err(|e| CatalogError(e.to_string()))?;
        Ok(())
    }
}

/// In-memory catalog for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    entries: Mutex<Vec<CatalogEntry>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl BarcodeCatalog for MemoryCatalog {
    fn store(&self, entry: &CatalogEntry) -> Result<(), CatalogError> {
        self.entries
            .lock()
            .map_err(|_| CatalogError("catalog lock poisoned".into()))?
            .push(entry.clone());
        Ok(())
    }
}
