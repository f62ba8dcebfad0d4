use std::{sync::Arc, time::Duration};

use tokio::runtime::Runtime;

use crate::{Config, DataSource, Enricher, MemSource, Result, enricher::build_runtime};

pub struct EnricherBuilder {
    config: Config,
    source: Option<Arc<dyn DataSource>>,
    rt: Option<Arc<Runtime>>,
}

impl Default for EnricherBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            source: None,
            rt: None,
        }
    }
}

impl EnricherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every setting with `config`; later setters still apply.
    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn source(
        mut self,
        source: Arc<dyn DataSource>,
    ) -> Self {
        self.source = Some(source);
        self
    }

    pub fn refresh_interval(
        mut self,
        interval: Duration,
    ) -> Self {
        self.config.refresh.interval_override = Some(interval);
        self
    }

    pub fn require_initial_load(
        mut self,
        required: bool,
    ) -> Self {
        self.config.refresh.require_initial_load = required;
        self
    }

    pub fn scratch_pool_size(
        mut self,
        size: usize,
    ) -> Self {
        self.config.transform.scratch_pool_size = size;
        self
    }

    pub fn async_worker_thread_number(
        mut self,
        n: u16,
    ) -> Self {
        self.config.async_worker_thread_number = n;
        self
    }

    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    /// Builds the enricher; without an explicit source the configured
    /// in-memory source is used.
    pub fn build(self) -> Result<Enricher> {
        let runtime = match self.rt {
            Some(rt) => rt,
            None => build_runtime(self.config.async_worker_thread_number)?,
        };
        let source: Arc<dyn DataSource> = match self.source {
            Some(source) => source,
            None => match &self.config.source.seed_file {
                Some(path) => Arc::new(MemSource::load(path)?),
                None => Arc::new(MemSource::new()),
            },
        };

        Enricher::new(self.config, source, runtime)
    }
}
