use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{EnrichError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// number of async worker threads, defaults to 4
    pub async_worker_thread_number: u16,
    /// refresh config
    pub refresh: RefreshConfig,
    /// transform config
    pub transform: TransformConfig,
    /// source config
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// seconds between two load passes, defaults to 300
    pub interval_secs: u64,
    /// fail `launch` when the first load pass fails
    pub require_initial_load: bool,
    /// finer-grained interval set programmatically, wins over `interval_secs`
    #[serde(skip)]
    pub interval_override: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// max idle scratch objects kept for reuse
    pub scratch_pool_size: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    /// json graph file loaded into the in-memory source
    pub seed_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            async_worker_thread_number: 4,
            refresh: RefreshConfig::default(),
            transform: TransformConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            require_initial_load: true,
            interval_override: None,
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            scratch_pool_size: 64,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        self.interval_override.unwrap_or(Duration::from_secs(self.interval_secs))
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())
            .map_err(|e| EnrichError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.async_worker_thread_number == 0 {
            return Err(EnrichError::Config("async_worker_thread_number must be at least 1".into()));
        }
        if self.refresh.interval().is_zero() {
            return Err(EnrichError::Config("refresh interval must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{Config, EnrichError};

    #[test]
    fn test_config_deserialize() {
        let toml_str = r#"
        async_worker_thread_number = 8
        [refresh]
        interval_secs = 60
        require_initial_load = false

        [transform]
        scratch_pool_size = 16

        [source]
        seed_file = "data/graph.json"
        "#;
        let config = Config::load_from_str(toml_str).unwrap();
        assert_eq!(config.async_worker_thread_number, 8);
        assert_eq!(config.refresh.interval_secs, 60);
        assert!(!config.refresh.require_initial_load);
        assert_eq!(config.transform.scratch_pool_size, 16);
        assert_eq!(config.source.seed_file.as_deref(), Some("data/graph.json"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config.async_worker_thread_number, 4);
        assert_eq!(config.refresh.interval().as_secs(), 300);
        assert!(config.refresh.require_initial_load);
        assert_eq!(config.transform.scratch_pool_size, 64);
        assert!(config.source.seed_file.is_none());
    }

    #[test]
    fn test_config_rejects_zero_interval() {
        let err = Config::load_from_str("[refresh]\ninterval_secs = 0").unwrap_err();
        assert!(matches!(err, EnrichError::Config(_)));
    }

    #[test]
    fn test_config_rejects_bad_toml() {
        let err = Config::load_from_str("async_worker_thread_number = \"many\"").unwrap_err();
        assert!(matches!(err, EnrichError::Config(_)));
    }

    #[test]
    fn test_config_missing_file() {
        let err = Config::create("/nonexistent/qaenrich.toml").unwrap_err();
        assert!(err.to_string().contains("failed to load config file"));
    }
}
