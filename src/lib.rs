//! # QAEnrich
//!
//! QAEnrich enriches a caller-supplied list of (question, answer) pairs with
//! pairs inferred from a country-keyed reference graph.
//!
//! ## Core Features
//!
//! - **Snapshot Cache**: An immutable copy of the mapping → cell → answer graph, rebuilt off to the side and swapped in atomically
//! - **Background Refresh**: A cancellable periodic task reloads the graph from a pluggable `DataSource`
//! - **Unambiguous Inference**: Only pairs whose answer id is unique within the country and whose cell has no repeated question are inferred
//! - **Pluggable Source**: Ships an in-memory source; any other backend implements `DataSource`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use qaenrich::{EnricherBuilder, MemSource, QAEntry};
//!
//! let source = Arc::new(MemSource::from_json(json_str)?);
//! let enricher = EnricherBuilder::new().source(source).build()?;
//! enricher.launch()?;
//!
//! let output = enricher.transform("US", &[QAEntry::new(1, 10)]);
//!
//! enricher.shutdown();
//! ```

mod builder;
mod cache;
mod common;
mod config;
mod enricher;
mod error;
mod model;
mod source;
mod transform;
mod utils;

pub use builder::EnricherBuilder;
pub use cache::{CacheStatus, Snapshot, SnapshotCache};
pub use common::{Pool, Pooled, Reset};
pub use config::*;
pub use enricher::{Enricher, RefreshEvent};
pub use error::EnrichError;
pub use model::*;
pub use source::{DataSource, GraphLevel, MemSource, map_source_err};
pub use transform::{Scratch, Transformer, transform};

/// Result type alias for QAEnrich operations.
pub type Result<T> = std::result::Result<T, EnrichError>;
