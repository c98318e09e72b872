//! Versioned catalog snapshots

use std::{
    ops::Deref,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use tracing::info;

use crate::catalog::{
    Catalog,
    csv::{CatalogIoError, LoadStats, load_catalog},
};

/// Owns the catalog file and hands out immutable snapshots.
///
/// Planning always works on a [`CatalogSnapshot`]; a [`CatalogProvider::reload`]
/// swaps in a new snapshot without invalidating the ones already handed out.
#[derive(Debug)]
pub struct CatalogProvider {
    path: PathBuf,
    state: RwLock<ProviderState>,
}

#[derive(Debug)]
struct ProviderState {
    catalog: Arc<Catalog>,
    version: u64,
}

/// An immutable catalog snapshot taken from a [`CatalogProvider`].
///
/// Dereferences to [`Catalog`], so it can be passed anywhere a catalog
/// reference is expected.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    catalog: Arc<Catalog>,
    version: u64,
}

/// Outcome of a successful [`CatalogProvider::reload`].
#[derive(Debug, Clone, Copy)]
pub struct ReloadReport {
    /// Version number the provider serves from now on
    pub version: u64,

    /// Row bookkeeping from the load
    pub stats: LoadStats,
}

impl CatalogProvider {
    /// Open a provider, loading the catalog file once.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogIoError`] if the file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CatalogIoError> {
        let path = path.into();
        let (catalog, stats) = load_catalog(&path)?;

        info!(
            path = %path.display(),
            products = catalog.len(),
            loaded = stats.loaded,
            "opened catalog"
        );

        Ok(Self {
            path,
            state: RwLock::new(ProviderState {
                catalog: Arc::new(catalog),
                version: 1,
            }),
        })
    }

    /// Take the current snapshot. Cheap: bumps an `Arc` reference count.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

        CatalogSnapshot {
            catalog: Arc::clone(&state.catalog),
            version: state.version,
        }
    }

    /// Re-read the catalog file and swap in a new snapshot.
    ///
    /// On failure the provider keeps serving the previous snapshot unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogIoError`] if the file cannot be read or parsed.
    pub fn reload(&self) -> Result<ReloadReport, CatalogIoError> {
        let (catalog, stats) = load_catalog(&self.path)?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        state.catalog = Arc::new(catalog);
        state.version += 1;

        info!(
            path = %self.path.display(),
            version = state.version,
            products = state.catalog.len(),
            "reloaded catalog"
        );

        Ok(ReloadReport {
            version: state.version,
            stats,
        })
    }

    /// Path of the backing catalog file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSnapshot {
    /// Provider state version this snapshot was taken from.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Borrow the underlying catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

impl Deref for CatalogSnapshot {
    type Target = Catalog;

    fn deref(&self) -> &Self::Target {
        &self.catalog
    }
}
