//! Enrichment of question/answer pairs from a snapshot.
//!
//! `transform` is the pure algorithm over one snapshot; `Transformer` binds
//! it to a `SnapshotCache` and a scratch pool.

mod transformer;

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::{Answer, AnswerId, QAEntry, QuestionId, Snapshot, common::Reset};

pub use transformer::Transformer;

/// Per-call working storage of the transform algorithm.
#[derive(Debug, Default)]
pub struct Scratch {
    /// Pairs already in the output.
    existing: HashSet<QAEntry>,
    /// Occurrences of each answer id across the country's whole graph.
    answer_count: HashMap<AnswerId, usize>,
    /// Occurrences of each question id inside the current cell.
    question_count: HashMap<QuestionId, usize>,
}

impl Reset for Scratch {
    fn reset(&mut self) {
        self.existing.clear();
        self.answer_count.clear();
        self.question_count.clear();
    }
}

impl Scratch {
    /// True when some question id occurs more than once among `answers`.
    fn has_repeated_question(
        &mut self,
        answers: &[Answer],
    ) -> bool {
        self.question_count.clear();
        answers.iter().any(|a| {
            let count = self.question_count.entry(a.question_id).or_default();
            *count += 1;
            *count > 1
        })
    }

    fn is_ambiguous_answer(
        &self,
        answer_id: AnswerId,
    ) -> bool {
        self.answer_count.get(&answer_id).copied().unwrap_or_default() > 1
    }
}

/// Returns `entries` followed by every pair of `country`'s graph that can be
/// inferred without ambiguity.
///
/// A pair is inferred when its cell has no repeated question id, its answer
/// id occurs exactly once across the country's graph, and it is not already
/// present. Inferred pairs follow mapping → cell → answer order. A country
/// without mappings yields `entries` unchanged.
///
/// `scratch` is cleared on entry and left dirty on return.
pub fn transform(
    snapshot: &Snapshot,
    country: &str,
    entries: &[QAEntry],
    scratch: &mut Scratch,
) -> Vec<QAEntry> {
    scratch.reset();

    let mappings = snapshot.mappings(country);
    if mappings.is_empty() {
        trace!("transform({country}) no mappings, passing {} entries through", entries.len());
        return entries.to_vec();
    }

    scratch.existing.extend(entries.iter().copied());

    for answer in snapshot.country_answers(country) {
        *scratch.answer_count.entry(answer.answer_id).or_default() += 1;
    }

    let mut output = Vec::with_capacity(entries.len() * 2);
    output.extend_from_slice(entries);

    for mapping in mappings {
        for cell in snapshot.cells(mapping.id) {
            let answers = snapshot.answers(cell.id);
            if scratch.has_repeated_question(answers) {
                trace!("transform({country}) skipping ambiguous cell {}", cell.id);
                continue;
            }

            for answer in answers {
                if scratch.is_ambiguous_answer(answer.answer_id) {
                    continue;
                }
                let entry = answer.entry();
                if scratch.existing.insert(entry) {
                    output.push(entry);
                }
            }
        }
    }

    trace!("transform({country}) inferred {} entries", output.len() - entries.len());
    output
}
