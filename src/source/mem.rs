use std::{
    fs,
    path::Path,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use tracing::debug;

use crate::{Answer, Cell, CellId, DataSource, EnrichError, GraphData, Mapping, MappingId, Result};

/// In-memory `DataSource`.
///
/// Rows are served in insertion order. Writers may replace the graph at any
/// time; the next refresh picks the change up.
#[derive(Debug, Default)]
pub struct MemSource {
    graph: RwLock<GraphData>,
}

impl MemSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_graph(graph: GraphData) -> Self {
        Self {
            graph: RwLock::new(graph),
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(Self::from_graph(GraphData::from_json(s)?))
    }

    /// Loads a JSON graph file.
    pub fn load<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())
            .map_err(|e| EnrichError::IoError(format!("failed to load graph file {:?}: {}", path.as_ref(), e)))?;
        Self::from_json(&data)
    }

    pub fn insert_mapping(
        &self,
        mapping: Mapping,
    ) {
        self.write().mappings.push(mapping);
    }

    pub fn insert_cell(
        &self,
        cell: Cell,
    ) {
        self.write().cells.push(cell);
    }

    pub fn insert_answer(
        &self,
        answer: Answer,
    ) {
        self.write().answers.push(answer);
    }

    /// Swaps the whole graph.
    pub fn replace(
        &self,
        graph: GraphData,
    ) {
        *self.write() = graph;
    }

    pub fn clear(&self) {
        *self.write() = GraphData::default();
    }

    pub fn graph(&self) -> GraphData {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, GraphData> {
        self.graph.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphData> {
        self.graph.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DataSource for MemSource {
    fn fetch_all_mappings(&self) -> Result<Vec<Mapping>> {
        let mappings = self.read().mappings.clone();
        debug!("mem::fetch_all_mappings() -> {}", mappings.len());
        Ok(mappings)
    }

    fn fetch_cells(
        &self,
        mapping_id: MappingId,
    ) -> Result<Vec<Cell>> {
        let cells = self.read().cells.iter().filter(|c| c.mapping_id == mapping_id).copied().collect::<Vec<_>>();
        debug!("mem::fetch_cells({mapping_id}) -> {}", cells.len());
        Ok(cells)
    }

    fn fetch_answers(
        &self,
        cell_id: CellId,
    ) -> Result<Vec<Answer>> {
        let answers = self.read().answers.iter().filter(|a| a.cell_id == cell_id).copied().collect::<Vec<_>>();
        debug!("mem::fetch_answers({cell_id}) -> {}", answers.len());
        Ok(answers)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_fetch_in_insertion_order() {
        let source = MemSource::new();
        source.insert_mapping(Mapping::new(2, "US"));
        source.insert_mapping(Mapping::new(1, "DE"));
        source.insert_cell(Cell::new(20, 2));
        source.insert_cell(Cell::new(10, 1));
        source.insert_cell(Cell::new(21, 2));
        source.insert_answer(Answer::new(1, 21, 5, 50));
        source.insert_answer(Answer::new(2, 20, 6, 60));
        source.insert_answer(Answer::new(3, 21, 7, 70));

        let ids = source.fetch_all_mappings().unwrap().iter().map(|m| m.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![2, 1]);

        assert_eq!(source.fetch_cells(2).unwrap(), vec![Cell::new(20, 2), Cell::new(21, 2)]);
        assert!(source.fetch_cells(3).unwrap().is_empty());

        let answers = source.fetch_answers(21).unwrap().iter().map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(answers, vec![1, 3]);
    }

    #[test]
    fn test_from_json_and_replace() {
        let text = json!({
            "mappings": [{ "id": 1, "country": "US" }],
            "cells": [{ "id": 10, "mapping_id": 1 }],
            "answers": []
        })
        .to_string();
        let source = MemSource::from_json(&text).unwrap();
        assert_eq!(source.fetch_all_mappings().unwrap().len(), 1);

        source.replace(GraphData::default());
        assert!(source.fetch_all_mappings().unwrap().is_empty());
        assert!(source.fetch_cells(1).unwrap().is_empty());

        source.insert_mapping(Mapping::new(4, "FR"));
        source.clear();
        assert_eq!(source.graph(), GraphData::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = MemSource::load("/nonexistent/graph.json").unwrap_err();
        assert!(matches!(err, EnrichError::IoError(_)));
    }
}
