use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{Answer, Cell, CellId, DataSource, EnrichError, GraphLevel, Mapping, MappingId, Result, utils};

/// One fully loaded, immutable copy of the reference graph.
///
/// Every indexed cell belongs to a mapping of the same snapshot and every
/// indexed answer to a cell of the same snapshot. Lookups of unknown keys
/// return empty slices.
#[derive(Debug, Default)]
pub struct Snapshot {
    generation: u64,
    loaded_at: i64,
    mappings_by_country: HashMap<String, Vec<Mapping>>,
    cells_by_mapping: HashMap<MappingId, Vec<Cell>>,
    answers_by_cell: HashMap<CellId, Vec<Answer>>,
    answer_total: usize,
}

impl Snapshot {
    /// The generation-0 snapshot served before the first successful load.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Runs one all-or-nothing load pass against `source`.
    ///
    /// Mappings, then each mapping's cells, then each cell's answers are
    /// fetched in source order. The first fetch error or inconsistent row
    /// aborts the pass.
    pub(crate) fn load(source: &dyn DataSource) -> Result<Self> {
        let mut snapshot = Snapshot {
            loaded_at: utils::time::time_millis(),
            ..Default::default()
        };

        let mappings = source.fetch_all_mappings()?;
        debug!("snapshot::load() fetched {} mappings", mappings.len());

        for mapping in mappings {
            if snapshot.cells_by_mapping.contains_key(&mapping.id) {
                return Err(EnrichError::Malformed {
                    level: GraphLevel::Mappings,
                    message: format!("duplicate mapping id {}", mapping.id),
                });
            }

            let cells = source.fetch_cells(mapping.id)?;
            debug!("snapshot::load() fetched {} cells of mapping {}", cells.len(), mapping.id);
            for cell in &cells {
                if cell.mapping_id != mapping.id {
                    return Err(EnrichError::Malformed {
                        level: GraphLevel::Cells,
                        message: format!("cell {} belongs to mapping {}, expected {}", cell.id, cell.mapping_id, mapping.id),
                    });
                }
                if snapshot.answers_by_cell.contains_key(&cell.id) {
                    return Err(EnrichError::Malformed {
                        level: GraphLevel::Cells,
                        message: format!("duplicate cell id {}", cell.id),
                    });
                }

                let answers = source.fetch_answers(cell.id)?;
                debug!("snapshot::load() fetched {} answers of cell {}", answers.len(), cell.id);
                let mut answer_ids = HashSet::with_capacity(answers.len());
                for answer in &answers {
                    if answer.cell_id != cell.id {
                        return Err(EnrichError::Malformed {
                            level: GraphLevel::Answers,
                            message: format!("answer {} belongs to cell {}, expected {}", answer.id, answer.cell_id, cell.id),
                        });
                    }
                    if !answer_ids.insert(answer.id) {
                        return Err(EnrichError::Malformed {
                            level: GraphLevel::Answers,
                            message: format!("duplicate answer id {} in cell {}", answer.id, cell.id),
                        });
                    }
                }

                snapshot.answer_total += answers.len();
                snapshot.answers_by_cell.insert(cell.id, answers);
            }

            snapshot.cells_by_mapping.insert(mapping.id, cells);
            snapshot.mappings_by_country.entry(mapping.country.clone()).or_default().push(mapping);
        }

        Ok(snapshot)
    }

    pub(crate) fn with_generation(
        mut self,
        generation: u64,
    ) -> Self {
        self.generation = generation;
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Unix millis at which the load pass started; 0 for the empty snapshot.
    pub fn loaded_at(&self) -> i64 {
        self.loaded_at
    }

    pub fn mappings(
        &self,
        country: &str,
    ) -> &[Mapping] {
        self.mappings_by_country.get(country).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn cells(
        &self,
        mapping_id: MappingId,
    ) -> &[Cell] {
        self.cells_by_mapping.get(&mapping_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn answers(
        &self,
        cell_id: CellId,
    ) -> &[Answer] {
        self.answers_by_cell.get(&cell_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every answer reachable from `country`, in mapping → cell → answer order.
    pub fn country_answers<'a>(
        &'a self,
        country: &str,
    ) -> impl Iterator<Item = &'a Answer> + 'a {
        self.mappings(country).iter().flat_map(|m| self.cells(m.id)).flat_map(|c| self.answers(c.id))
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.mappings_by_country.keys().map(String::as_str)
    }

    pub fn mapping_count(&self) -> usize {
        self.cells_by_mapping.len()
    }

    pub fn cell_count(&self) -> usize {
        self.answers_by_cell.len()
    }

    pub fn answer_count(&self) -> usize {
        self.answer_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphData, MemSource};

    fn us_graph() -> GraphData {
        GraphData {
            mappings: vec![Mapping::new(1, "US"), Mapping::new(2, "DE"), Mapping::new(3, "US")],
            cells: vec![Cell::new(10, 1), Cell::new(11, 1), Cell::new(30, 3)],
            answers: vec![Answer::new(100, 10, 1, 1), Answer::new(101, 10, 2, 2), Answer::new(102, 30, 3, 3)],
        }
    }

    #[test]
    fn test_load_indexes_every_level() {
        let source = MemSource::from_graph(us_graph());
        let snapshot = Snapshot::load(&source).unwrap();

        assert_eq!(snapshot.generation(), 0);
        assert!(snapshot.loaded_at() > 0);
        assert_eq!(snapshot.mapping_count(), 3);
        assert_eq!(snapshot.cell_count(), 3);
        assert_eq!(snapshot.answer_count(), 3);

        let us = snapshot.mappings("US").iter().map(|m| m.id).collect::<Vec<_>>();
        assert_eq!(us, vec![1, 3]);
        assert_eq!(snapshot.cells(1), &[Cell::new(10, 1), Cell::new(11, 1)]);
        assert!(snapshot.cells(2).is_empty());
        assert!(snapshot.answers(11).is_empty());

        let ids = snapshot.country_answers("US").map(|a| a.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![100, 101, 102]);

        let mut countries = snapshot.countries().collect::<Vec<_>>();
        countries.sort();
        assert_eq!(countries, vec!["DE", "US"]);
    }

    #[test]
    fn test_unknown_keys_are_empty() {
        let snapshot = Snapshot::empty();
        assert!(snapshot.mappings("ZZ").is_empty());
        assert!(snapshot.cells(42).is_empty());
        assert!(snapshot.answers(42).is_empty());
        assert_eq!(snapshot.country_answers("ZZ").count(), 0);
    }

    #[test]
    fn test_load_rejects_duplicate_mapping() {
        let mut graph = us_graph();
        graph.mappings.push(Mapping::new(1, "FR"));
        let err = Snapshot::load(&MemSource::from_graph(graph)).unwrap_err();
        assert!(matches!(err, EnrichError::Malformed { level: GraphLevel::Mappings, .. }));
    }

    #[test]
    fn test_load_rejects_shared_cell_id() {
        let mut graph = us_graph();
        graph.cells.push(Cell::new(10, 3));
        let err = Snapshot::load(&MemSource::from_graph(graph)).unwrap_err();
        assert!(matches!(err, EnrichError::Malformed { level: GraphLevel::Cells, .. }));
    }

    #[test]
    fn test_load_rejects_duplicate_answer_in_cell() {
        let mut graph = us_graph();
        graph.answers.push(Answer::new(101, 10, 5, 5));
        let err = Snapshot::load(&MemSource::from_graph(graph)).unwrap_err();
        assert_eq!(
            err,
            EnrichError::Malformed {
                level: GraphLevel::Answers,
                message: "duplicate answer id 101 in cell 10".to_string(),
            }
        );
    }

    struct MisroutedSource(MemSource);

    impl DataSource for MisroutedSource {
        fn fetch_all_mappings(&self) -> Result<Vec<Mapping>> {
            self.0.fetch_all_mappings()
        }

        fn fetch_cells(
            &self,
            mapping_id: MappingId,
        ) -> Result<Vec<Cell>> {
            self.0.fetch_cells(mapping_id)
        }

        fn fetch_answers(
            &self,
            _cell_id: CellId,
        ) -> Result<Vec<Answer>> {
            Ok(vec![Answer::new(9, 999, 1, 1)])
        }
    }

    #[test]
    fn test_load_rejects_answer_of_other_cell() {
        let source = MisroutedSource(MemSource::from_graph(us_graph()));
        let err = Snapshot::load(&source).unwrap_err();
        assert_eq!(
            err,
            EnrichError::Malformed {
                level: GraphLevel::Answers,
                message: "answer 9 belongs to cell 999, expected 10".to_string(),
            }
        );
    }
}
