use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    runtime::Runtime,
    sync::broadcast,
    task,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, error};

use crate::{
    EnrichError, Result, SnapshotCache,
    common::{BroadcastQueue, Queue, Shutdown},
};

/// At most one manual refresh waits behind the running pass.
const REFRESH_COMMAND_QUEUE_SIZE: usize = 1;
const REFRESH_EVENT_QUEUE_SIZE: usize = 64;

/// Outcome of one load pass, broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RefreshEvent {
    Published {
        generation: u64,
    },
    Failed {
        error: EnrichError,
    },
}

#[derive(Debug, Clone, Copy)]
enum RefreshCommand {
    Refresh,
}

/// Periodic background refresh of a `SnapshotCache`.
///
/// Runs on a timer until the shutdown signal fires, and also on demand via
/// `request`. There is no retry inside a pass; the next tick is the retry.
pub struct Refresher {
    cache: Arc<SnapshotCache>,
    interval: Duration,
    commands: Arc<Queue<RefreshCommand>>,
    events: Arc<BroadcastQueue<RefreshEvent>>,

    runtime: Arc<Runtime>,
    shutdown: Arc<Shutdown>,
}

impl Refresher {
    pub fn new(
        cache: Arc<SnapshotCache>,
        interval: Duration,
        runtime: Arc<Runtime>,
        shutdown: Arc<Shutdown>,
    ) -> Self {
        Self {
            cache,
            interval,
            commands: Queue::new(REFRESH_COMMAND_QUEUE_SIZE),
            events: BroadcastQueue::new(REFRESH_EVENT_QUEUE_SIZE),
            runtime,
            shutdown,
        }
    }

    /// Spawns the refresh loop; the first timed pass runs one interval from now.
    pub fn start(&self) {
        let cache = self.cache.clone();
        let commands = self.commands.clone();
        let events = self.events.clone();
        let shutdown = self.shutdown.clone();
        let interval = self.interval;

        self.runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.wait() => break,
                    _ = ticker.tick() => {}
                    Some(RefreshCommand::Refresh) = commands.next_async() => {}
                }

                let cache = cache.clone();
                let events = events.clone();
                if let Err(e) = task::spawn_blocking(move || run_pass(&cache, &events)).await {
                    error!("refresh pass aborted: {e}");
                }
            }
            debug!("refresher stopped");
        });
    }

    /// Runs one pass on the calling thread.
    pub fn refresh_now(&self) -> Result<u64> {
        run_pass(&self.cache, &self.events)
    }

    /// Asks the loop for an immediate pass.
    ///
    /// Returns false when a requested pass is already pending, in which case
    /// this request is folded into it.
    pub fn request(&self) -> bool {
        self.commands.try_send(RefreshCommand::Refresh).is_ok()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.events.subscribe()
    }
}

fn run_pass(
    cache: &SnapshotCache,
    events: &BroadcastQueue<RefreshEvent>,
) -> Result<u64> {
    let result = cache.refresh();
    let event = match &result {
        Ok(generation) => RefreshEvent::Published {
            generation: *generation,
        },
        Err(error) => RefreshEvent::Failed {
            error: error.clone(),
        },
    };
    // no subscribers is fine
    let _ = events.send(event);
    result
}
