mod pool;
mod queue;
mod shutdown;

pub use pool::{Pool, Pooled, Reset};
pub use queue::{BroadcastQueue, Queue};
pub use shutdown::Shutdown;
