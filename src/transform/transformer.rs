use std::{sync::Arc, time::Instant};

use tracing::debug;

use crate::{QAEntry, SnapshotCache, TransformRequest, TransformResponse, common::Pool};

use super::{Scratch, transform};

/// Runs `transform` against whichever snapshot is active at call start.
///
/// Safe to share between any number of request workers.
pub struct Transformer {
    cache: Arc<SnapshotCache>,
    scratch: Pool<Scratch>,
}

impl Transformer {
    pub fn new(
        cache: Arc<SnapshotCache>,
        scratch_pool_size: usize,
    ) -> Self {
        Self {
            cache,
            scratch: Pool::new(scratch_pool_size),
        }
    }

    pub fn transform(
        &self,
        country: &str,
        entries: &[QAEntry],
    ) -> Vec<QAEntry> {
        let start = Instant::now();
        let snapshot = self.cache.snapshot();
        let mut scratch = self.scratch.checkout();

        let output = transform(&snapshot, country, entries, &mut scratch);

        debug!(
            country,
            generation = snapshot.generation(),
            input_pairs = entries.len(),
            output_pairs = output.len(),
            elapsed = ?start.elapsed(),
            "request processed"
        );
        output
    }

    pub fn transform_request(
        &self,
        req: &TransformRequest,
    ) -> TransformResponse {
        TransformResponse {
            data: self.transform(&req.country, &req.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{Answer, Cell, GraphData, Mapping, MemSource};

    fn transformer(pool_size: usize) -> (Arc<MemSource>, Arc<SnapshotCache>, Transformer) {
        let source = Arc::new(MemSource::from_graph(GraphData {
            mappings: vec![Mapping::new(1, "US")],
            cells: vec![Cell::new(10, 1), Cell::new(11, 1)],
            answers: vec![Answer::new(1, 10, 1, 11), Answer::new(2, 11, 2, 22)],
        }));
        let cache = Arc::new(SnapshotCache::new(source.clone()));
        cache.refresh().unwrap();
        let transformer = Transformer::new(cache.clone(), pool_size);
        (source, cache, transformer)
    }

    #[test]
    fn test_transform_request() {
        let (_, _, transformer) = transformer(4);
        let resp = transformer.transform_request(&TransformRequest {
            country: "US".to_string(),
            data: vec![QAEntry::new(1, 11)],
        });
        assert_eq!(resp.data, vec![QAEntry::new(1, 11), QAEntry::new(2, 22)]);
    }

    #[test]
    fn test_scratch_does_not_leak_between_calls() {
        let (_, _, transformer) = transformer(1);
        // first call marks (2, 22) as existing; a leak would suppress it next time
        let first = transformer.transform("US", &[QAEntry::new(2, 22)]);
        assert_eq!(first, vec![QAEntry::new(2, 22), QAEntry::new(1, 11)]);

        let second = transformer.transform("US", &[]);
        assert_eq!(second, vec![QAEntry::new(1, 11), QAEntry::new(2, 22)]);
    }

    #[test]
    fn test_sees_refreshed_snapshot() {
        let (source, cache, transformer) = transformer(4);
        source.insert_mapping(Mapping::new(2, "DE"));
        source.insert_cell(Cell::new(20, 2));
        source.insert_answer(Answer::new(3, 20, 3, 33));

        assert!(transformer.transform("DE", &[]).is_empty());
        cache.refresh().unwrap();
        assert_eq!(transformer.transform("DE", &[]), vec![QAEntry::new(3, 33)]);
    }

    #[test]
    fn test_concurrent_transforms_agree() {
        let (_, _, transformer) = transformer(2);
        let transformer = Arc::new(transformer);
        let expected = transformer.transform("US", &[QAEntry::new(5, 5)]);

        let workers = (0..8)
            .map(|_| {
                let transformer = transformer.clone();
                let expected = expected.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        assert_eq!(transformer.transform("US", &[QAEntry::new(5, 5)]), expected);
                    }
                })
            })
            .collect::<Vec<_>>();

        for worker in workers {
            worker.join().unwrap();
        }
    }
}
