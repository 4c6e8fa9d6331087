//! Durable record of previously-downloaded filenames.
//!
//! Backed by a flat JSON object (`filename` → marker) stored inside the
//! download directory, so each directory carries its own history. Reads are
//! forgiving (a missing or corrupt file just means an empty ledger); writes
//! are plain overwrites with no atomic rename.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

/// Marker stored against each filename. Only key presence matters.
const MARKER: &str = "s";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to write ledger file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone)]
pub struct Ledger {
    entries: HashMap<String, String>,
}

impl Ledger {
    /// Load the ledger from `path`.
    ///
    /// A missing file yields an empty ledger. Read or parse failures are
    /// logged and also yield an empty ledger — the retrieval proceeds and may
    /// re-download, it never aborts here.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to read ledger file, starting empty: {e}");
                return Self::default();
            }
        };
        match serde_json::from_str::<HashMap<String, String>>(&raw) {
            Ok(entries) => {
                tracing::debug!(entries = entries.len(), path = %path.display(), "Loaded ledger");
                Self { entries }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to parse ledger file, starting empty: {e}");
                Self::default()
            }
        }
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    /// Record a filename in memory. Durable only after [`Ledger::flush`].
    pub fn record(&mut self, filename: String) {
        self.entries.insert(filename, MARKER.to_string());
    }

    /// Serialize the ledger to `path`, overwriting any existing file.
    pub fn flush(&self, path: &Path) -> Result<(), LedgerError> {
        let serialized = serde_json::to_vec_pretty(&self.entries)?;
        std::fs::write(path, serialized).map_err(|source| LedgerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(entries = self.entries.len(), path = %path.display(), "Flushed ledger");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
