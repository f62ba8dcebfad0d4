use serde::{Deserialize, Serialize};

use crate::{QAEntry, Result};

pub type MappingId = i64;
pub type CellId = i64;
pub type QuestionId = i64;
pub type AnswerId = i64;

/// Country-scoped grouping of cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    pub id: MappingId,
    pub country: String,
}

/// Sub-grouping of answers inside a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub mapping_id: MappingId,
}

/// A (question, answer) association scoped to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub cell_id: CellId,
    pub question_id: QuestionId,
    pub answer_id: AnswerId,
}

impl Mapping {
    pub fn new(
        id: MappingId,
        country: impl Into<String>,
    ) -> Self {
        Self {
            id,
            country: country.into(),
        }
    }
}

impl Cell {
    pub fn new(
        id: CellId,
        mapping_id: MappingId,
    ) -> Self {
        Self {
            id,
            mapping_id,
        }
    }
}

impl Answer {
    pub fn new(
        id: i64,
        cell_id: CellId,
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Self {
        Self {
            id,
            cell_id,
            question_id,
            answer_id,
        }
    }

    /// The pair this answer would contribute to a transform output.
    pub fn entry(&self) -> QAEntry {
        QAEntry::new(self.question_id, self.answer_id)
    }
}

/// Flat, serializable form of a whole reference graph.
///
/// Used to seed the in-memory source from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub mappings: Vec<Mapping>,
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl GraphData {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str::<GraphData>(s)?)
    }
}
