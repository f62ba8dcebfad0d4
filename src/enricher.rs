//! Enrichment service - the main entry point for QAEnrich.
//!
//! The enricher owns the snapshot cache and its background refresher, and
//! serves transforms against the active snapshot:
//! - Loading the first snapshot on launch
//! - Refreshing periodically and on demand
//! - Broadcasting refresh outcomes
//! - Deterministic shutdown of the refresh task

mod refresher;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::{runtime::Runtime, sync::broadcast};
use tracing::{info, warn};

use crate::{
    CacheStatus, Config, DataSource, EnrichError, MemSource, QAEntry, Result, SnapshotCache, TransformRequest, TransformResponse, Transformer,
    common::Shutdown,
};

use refresher::Refresher;
pub use refresher::RefreshEvent;

/// The enrichment service.
///
/// Explicitly constructed and passed to whatever serves requests; there is
/// no global instance. Transforms may be called from any number of threads,
/// before launch they pass input through unchanged.
///
/// # Example
///
/// ```rust,ignore
/// let enricher = Enricher::new_with_config(Config::default())?;
/// enricher.launch()?;
///
/// let output = enricher.transform("US", &entries);
///
/// enricher.shutdown();
/// ```
pub struct Enricher {
    /// Active snapshot and its load pass.
    cache: Arc<SnapshotCache>,
    /// Transform entry point bound to the cache.
    transformer: Transformer,
    /// Background refresh task.
    refresher: Refresher,

    /// Fail launch when the first load pass fails.
    require_initial_load: bool,
    /// Flag indicating if the enricher is running.
    running: Arc<AtomicBool>,
    /// Stop signal for the refresh task.
    shutdown: Arc<Shutdown>,
}

impl Enricher {
    /// Creates an enricher over the in-memory source described by `config`.
    ///
    /// The source is seeded from `source.seed_file` when set, otherwise it
    /// starts empty.
    pub fn new_with_config(config: Config) -> Result<Self> {
        let source = match &config.source.seed_file {
            Some(path) => MemSource::load(path)?,
            None => MemSource::new(),
        };
        let runtime = build_runtime(config.async_worker_thread_number)?;
        Self::new(config, Arc::new(source), runtime)
    }

    pub(crate) fn new(
        config: Config,
        source: Arc<dyn DataSource>,
        runtime: Arc<Runtime>,
    ) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(SnapshotCache::new(source));
        let shutdown = Arc::new(Shutdown::new());
        let refresher = Refresher::new(cache.clone(), config.refresh.interval(), runtime, shutdown.clone());
        let transformer = Transformer::new(cache.clone(), config.transform.scratch_pool_size);

        Ok(Self {
            cache,
            transformer,
            refresher,
            require_initial_load: config.refresh.require_initial_load,
            running: Arc::new(AtomicBool::new(false)),
            shutdown,
        })
    }

    /// Loads the first snapshot and starts the periodic refresh.
    ///
    /// Launching a running enricher is a no-op. A failed first load is
    /// returned when `require_initial_load` is set, otherwise the enricher
    /// starts on the empty snapshot and retries on the next tick.
    pub fn launch(&self) -> Result<()> {
        if self.shutdown.is_shutdown() {
            return Err(EnrichError::Engine("enricher has been shut down".to_string()));
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Err(e) = self.refresher.refresh_now() {
            if self.require_initial_load {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
            warn!("initial cache load failed, serving empty snapshot: {e}");
        }

        self.refresher.start();
        info!(generation = self.cache.snapshot().generation(), "enricher launched");
        Ok(())
    }

    /// Stops the refresh task. Idempotent; the enricher cannot be relaunched.
    ///
    /// A pass already running finishes, but its successor never starts.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        if !self.shutdown.is_shutdown() {
            self.shutdown.shutdown();
            info!("enricher shut down");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns `entries` followed by the pairs inferable for `country`.
    pub fn transform(
        &self,
        country: &str,
        entries: &[QAEntry],
    ) -> Vec<QAEntry> {
        self.transformer.transform(country, entries)
    }

    pub fn transform_request(
        &self,
        req: &TransformRequest,
    ) -> TransformResponse {
        self.transformer.transform_request(req)
    }

    /// Runs one load pass on the calling thread and returns the new generation.
    pub fn refresh(&self) -> Result<u64> {
        self.refresher.refresh_now()
    }

    /// Wakes the refresh task for an immediate pass.
    ///
    /// Returns false when a requested pass is already pending.
    pub fn request_refresh(&self) -> bool {
        self.refresher.request()
    }

    /// Subscribes to the outcome of every later load pass.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.refresher.subscribe()
    }

    pub fn status(&self) -> CacheStatus {
        self.cache.status()
    }

    pub fn cache(&self) -> Arc<SnapshotCache> {
        self.cache.clone()
    }
}

impl Drop for Enricher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub(crate) fn build_runtime(worker_threads: u16) -> Result<Arc<Runtime>> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads.max(1).into())
        .thread_name("qaenrich-worker")
        .enable_all()
        .build()
        .map(Arc::new)
        .map_err(|e| EnrichError::Engine(format!("failed to build runtime: {e}")))
}
