use std::{
    sync::{Arc, Mutex, PoisonError, RwLock},
    time::Instant,
};

use serde::Serialize;
use tracing::{info, warn};

use crate::{Answer, Cell, CellId, DataSource, EnrichError, Mapping, MappingId, Result};

use super::Snapshot;

/// Point-in-time view of the cache, for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatus {
    /// Generation of the active snapshot, 0 until the first successful refresh.
    pub generation: u64,
    /// Unix millis at which the active snapshot was loaded.
    pub loaded_at: i64,
    pub mappings: usize,
    pub cells: usize,
    pub answers: usize,
    /// Error of the most recent refresh, cleared by the next successful one.
    pub last_error: Option<EnrichError>,
    pub consecutive_failures: u32,
}

#[derive(Debug, Default)]
struct RefreshHealth {
    last_error: Option<EnrichError>,
    consecutive_failures: u32,
}

/// Holds the active snapshot and rebuilds it from a `DataSource`.
///
/// Lookups take the read lock only long enough to copy their result. A
/// refresh loads without any reader-visible lock and takes the write lock
/// for the pointer swap alone. Failed refreshes leave the active snapshot
/// untouched.
pub struct SnapshotCache {
    source: Arc<dyn DataSource>,
    active: RwLock<Arc<Snapshot>>,
    /// Serializes load passes; readers never touch it.
    refreshing: Mutex<()>,
    health: Mutex<RefreshHealth>,
}

impl SnapshotCache {
    /// Creates a cache serving the empty snapshot until the first refresh.
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            active: RwLock::new(Arc::new(Snapshot::empty())),
            refreshing: Mutex::new(()),
            health: Mutex::new(RefreshHealth::default()),
        }
    }

    /// Performs one load pass and publishes the result.
    ///
    /// Returns the generation of the newly active snapshot, or the first
    /// error of the pass, in which case nothing is published.
    pub fn refresh(&self) -> Result<u64> {
        let _refreshing = self.refreshing.lock().unwrap_or_else(PoisonError::into_inner);
        let start = Instant::now();

        let loaded = Snapshot::load(self.source.as_ref());
        let mut health = self.health.lock().unwrap_or_else(PoisonError::into_inner);

        match loaded {
            Ok(snapshot) => {
                // only this pass can publish while `refreshing` is held
                let generation = self.snapshot().generation() + 1;
                let next = Arc::new(snapshot.with_generation(generation));
                let (mappings, cells, answers) = (next.mapping_count(), next.cell_count(), next.answer_count());

                let previous = std::mem::replace(&mut *self.active.write().unwrap_or_else(PoisonError::into_inner), next);
                drop(previous);

                health.last_error = None;
                health.consecutive_failures = 0;
                info!(generation, mappings, cells, answers, elapsed = ?start.elapsed(), "cache refresh completed");
                Ok(generation)
            }
            Err(err) => {
                health.last_error = Some(err.clone());
                health.consecutive_failures += 1;
                warn!(
                    error = %err,
                    consecutive_failures = health.consecutive_failures,
                    elapsed = ?start.elapsed(),
                    "cache refresh failed, keeping previous snapshot"
                );
                Err(err)
            }
        }
    }

    /// Takes a shared reference to the active snapshot.
    ///
    /// Every lookup made through the returned handle sees the same
    /// generation, whatever refreshes complete meanwhile.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn get_mappings(
        &self,
        country: &str,
    ) -> Vec<Mapping> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).mappings(country).to_vec()
    }

    pub fn get_cells(
        &self,
        mapping_id: MappingId,
    ) -> Vec<Cell> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).cells(mapping_id).to_vec()
    }

    pub fn get_answers(
        &self,
        cell_id: CellId,
    ) -> Vec<Answer> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).answers(cell_id).to_vec()
    }

    pub fn status(&self) -> CacheStatus {
        let snapshot = self.snapshot();
        let health = self.health.lock().unwrap_or_else(PoisonError::into_inner);
        CacheStatus {
            generation: snapshot.generation(),
            loaded_at: snapshot.loaded_at(),
            mappings: snapshot.mapping_count(),
            cells: snapshot.cell_count(),
            answers: snapshot.answer_count(),
            last_error: health.last_error.clone(),
            consecutive_failures: health.consecutive_failures,
        }
    }
}
