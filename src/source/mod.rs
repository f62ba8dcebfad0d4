//! Data source layer supplying the raw reference graph.
//!
//! The snapshot cache pulls the whole graph through `DataSource` on every
//! refresh. Backends:
//! - `MemSource`: In-memory graph for tests, demos and seeded deployments
//! - anything else implements `DataSource` outside this crate

mod mem;

use std::error::Error;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::{Answer, Cell, CellId, EnrichError, Mapping, MappingId, Result};

pub use mem::MemSource;

/// Maps backend errors to EnrichError.
pub fn map_source_err(
    level: GraphLevel,
    key: impl ToString,
    err: impl Error,
) -> EnrichError {
    EnrichError::Source {
        level,
        key: key.to_string(),
        message: err.to_string(),
    }
}

/// Levels of the reference graph, outermost first.
#[derive(Debug, Clone, Copy, Display, PartialEq, Hash, Eq, EnumIter, Serialize, Deserialize)]
pub enum GraphLevel {
    #[strum(serialize = "mappings")]
    Mappings,
    #[strum(serialize = "cells")]
    Cells,
    #[strum(serialize = "answers")]
    Answers,
}

/// Supplier of the raw mapping → cell → answer graph.
///
/// Calls are blocking and may be slow; the cache never holds a lock that
/// readers need while calling into a source. Rows must be returned in a
/// stable order, which becomes the snapshot traversal order.
pub trait DataSource: Send + Sync {
    /// Fetches every mapping of every country.
    fn fetch_all_mappings(&self) -> Result<Vec<Mapping>>;

    /// Fetches the cells of one mapping.
    fn fetch_cells(
        &self,
        mapping_id: MappingId,
    ) -> Result<Vec<Cell>>;

    /// Fetches the answers of one cell.
    fn fetch_answers(
        &self,
        cell_id: CellId,
    ) -> Result<Vec<Answer>>;
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_graph_level_names() {
        let names = GraphLevel::iter().map(|l| l.to_string()).collect::<Vec<_>>();
        assert_eq!(names, vec!["mappings", "cells", "answers"]);
    }

    #[test]
    fn test_map_source_err() {
        let io = std::io::Error::other("timeout");
        let err = map_source_err(GraphLevel::Answers, "cell 3", io);
        assert_eq!(
            err,
            EnrichError::Source {
                level: GraphLevel::Answers,
                key: "cell 3".to_string(),
                message: "timeout".to_string(),
            }
        );
    }
}
