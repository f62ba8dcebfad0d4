use std::{sync::Arc, time::Duration};

use qaenrich::{Answer, Cell, EnricherBuilder, MemSource, QAEntry, RefreshEvent, TransformRequest};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();

    let source = Arc::new(MemSource::from_json(include_str!("./graph.json")).unwrap());

    let enricher = EnricherBuilder::new().source(source.clone()).refresh_interval(Duration::from_secs(1)).build().unwrap();
    enricher.launch().unwrap();

    let req: TransformRequest = serde_json::from_str(r#"{ "country": "US", "data": [{ "question_id": 9, "answer_id": 900 }] }"#).unwrap();
    let resp = enricher.transform_request(&req);
    println!("US: {}", serde_json::to_string(&resp).unwrap());

    // new data shows up after the next refresh
    let mut events = enricher.subscribe();
    source.insert_cell(Cell::new(5, 2));
    source.insert_answer(Answer::new(7, 5, 8, 108));
    enricher.request_refresh();

    loop {
        match events.blocking_recv() {
            Ok(RefreshEvent::Published { generation }) => {
                println!("published generation {generation}");
                break;
            }
            Ok(RefreshEvent::Failed { error }) => println!("refresh failed: {error}"),
            Err(e) => {
                println!("event channel closed: {e}");
                break;
            }
        }
    }

    println!("DE: {:?}", enricher.transform("DE", &[QAEntry::new(7, 107)]));
    println!("ZZ: {:?}", enricher.transform("ZZ", &[QAEntry::new(1, 1)]));
    println!("status: {}", serde_json::to_string_pretty(&enricher.status()).unwrap());

    enricher.shutdown();
}
