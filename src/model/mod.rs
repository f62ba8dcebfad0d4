mod entry;
mod graph;

pub use entry::{QAEntry, TransformRequest, TransformResponse};
pub use graph::{Answer, AnswerId, Cell, CellId, GraphData, Mapping, MappingId, QuestionId};
