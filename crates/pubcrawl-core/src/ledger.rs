//! Append-only record of identifiers that were already published.
//!
//! The file holds one identifier per line and is read fully into memory on
//! [`DedupLedger::open`]. Entries are only ever appended, and only after a
//! publish was confirmed. One process writes to a given ledger at a time.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::PublishError;

#[derive(Debug)]
pub struct DedupLedger {
    path: PathBuf,
    ids: HashSet<String>,
}

impl DedupLedger {
    /// Load the ledger at `path`. A missing file is an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Ledger`] if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PublishError> {
        let path = path.into();
        let ids = match std::fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(ledger_err(&path, e)),
        };
        tracing::debug!(path = %path.display(), entries = ids.len(), "ledger loaded");
        Ok(Self { path, ids })
    }

    #[must_use]
    pub fn is_published(&self, id: &str) -> bool {
        self.ids.contains(id.trim())
    }

    /// Append `id` to the ledger. Already-present ids are left alone.
    ///
    /// # Errors
    ///
    /// - [`PublishError::Invalid`] if `id` is blank or spans several lines.
    /// - [`PublishError::Ledger`] if the append fails; the in-memory set is
    ///   only updated after the write succeeded.
    pub fn mark_published(&mut self, id: &str) -> Result<(), PublishError> {
        let id = id.trim();
        if id.is_empty() || id.contains(['\n', '\r']) {
            return Err(PublishError::Invalid(format!(
                "ledger id must be a single non-empty line, got {id:?}"
            )));
        }
        if self.ids.contains(id) {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ledger_err(&self.path, e))?;
        writeln!(file, "{id}").map_err(|e| ledger_err(&self.path, e))?;
        file.flush().map_err(|e| ledger_err(&self.path, e))?;

        self.ids.insert(id.to_owned());
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ledger_err(path: &Path, source: std::io::Error) -> PublishError {
    PublishError::Ledger {
        path: path.display().to_string(),
        source,
    }
}
