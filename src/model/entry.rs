use serde::{Deserialize, Serialize};

use super::{AnswerId, QuestionId};

/// A (question, answer) pair, the unit of transform input and output.
///
/// Equality and hashing cover both ids, so the entry itself is the dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QAEntry {
    pub question_id: QuestionId,
    pub answer_id: AnswerId,
}

impl QAEntry {
    pub fn new(
        question_id: QuestionId,
        answer_id: AnswerId,
    ) -> Self {
        Self {
            question_id,
            answer_id,
        }
    }
}

impl From<(QuestionId, AnswerId)> for QAEntry {
    fn from((question_id, answer_id): (QuestionId, AnswerId)) -> Self {
        Self::new(question_id, answer_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformRequest {
    pub country: String,
    pub data: Vec<QAEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformResponse {
    pub data: Vec<QAEntry>,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_entry_key_has_no_concatenation_collisions() {
        let mut keys = HashSet::new();
        keys.insert(QAEntry::new(1, 23));
        keys.insert(QAEntry::new(12, 3));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_request_json_field_names() {
        let req: TransformRequest = serde_json::from_value(json!({
            "country": "US",
            "data": [{ "question_id": 1, "answer_id": 2 }]
        }))
        .unwrap();
        assert_eq!(req.country, "US");
        assert_eq!(req.data, vec![QAEntry::new(1, 2)]);

        let resp = TransformResponse {
            data: req.data,
        };
        assert_eq!(serde_json::to_value(&resp).unwrap(), json!({ "data": [{ "question_id": 1, "answer_id": 2 }] }));
    }
}
