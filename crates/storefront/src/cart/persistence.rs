//! Session-scoped cart persistence.
//!
//! The cart keeps its lines in memory; a backend only has to survive a
//! reload within the same session.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::CartLine;

/// Cart persistence failure.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session names become file names, so path characters are rejected.
    #[error("Invalid session name: {0}")]
    InvalidSession(String),

    #[error("Persistence unavailable: {0}")]
    Unavailable(String),
}

/// Where a cart's lines are kept between reloads.
pub trait CartPersistence: Send + Sync {
    /// Previously saved lines, or `None` when nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the saved state cannot be read or decoded.
    fn load(&self) -> Result<Option<Vec<CartLine>>, PersistenceError>;

    /// Replace the saved lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    fn save(&self, lines: &[CartLine]) -> Result<(), PersistenceError>;

    /// Forget the saved lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be removed.
    fn clear(&self) -> Result<(), PersistenceError>;
}

// =============================================================================
// In-memory
// =============================================================================

#[derive(Debug, Default)]
struct MemoryCart {
    lines: Option<Vec<CartLine>>,
    fail_writes: bool,
}

/// Process-scoped persistence. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartPersistence {
    inner: Arc<Mutex<MemoryCart>>,
}

impl MemoryCartPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every save and clear fail.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// The currently saved lines.
    #[must_use]
    pub fn saved(&self) -> Option<Vec<CartLine>> {
        self.lock().lines.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryCart> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartPersistence for MemoryCartPersistence {
    fn load(&self) -> Result<Option<Vec<CartLine>>, PersistenceError> {
        Ok(self.lock().lines.clone())
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), PersistenceError> {
        let mut cart = self.lock();
        if cart.fail_writes {
            return Err(PersistenceError::Unavailable("writes disabled".to_string()));
        }
        cart.lines = Some(lines.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        let mut cart = self.lock();
        if cart.fail_writes {
            return Err(PersistenceError::Unavailable("writes disabled".to_string()));
        }
        cart.lines = None;
        Ok(())
    }
}

// =============================================================================
// File
// =============================================================================

/// One JSON file per session under a directory.
#[derive(Debug, Clone)]
pub struct FileCartPersistence {
    path: PathBuf,
}

impl FileCartPersistence {
    /// Persistence for `session` stored as `<dir>/<session>.json`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidSession`] if the session name is
    /// empty or contains anything other than ASCII alphanumerics, `-` and `_`.
    pub fn new(dir: impl AsRef<Path>, session: &str) -> Result<Self, PersistenceError> {
        let valid = !session.is_empty()
            && session
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistenceError::InvalidSession(session.to_string()));
        }

        Ok(Self {
            path: dir.as_ref().join(format!("{session}.json")),
        })
    }

    /// The session file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartPersistence for FileCartPersistence {
    fn load(&self) -> Result<Option<Vec<CartLine>>, PersistenceError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_vec_pretty(lines)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
