pub mod coordinator;
pub mod enumerator;
pub mod oracle;
pub mod pool;
pub mod progress;
pub mod types;

pub use coordinator::SearchCoordinator;
pub use enumerator::{spawn_producer, Candidates};
pub use oracle::{LinkOracle, Oracle};
pub use pool::{PoolOutcome, WorkerPool};
pub use progress::{
    format_status, ProgressHandle, ProgressReporter, ProgressSink, ProgressSnapshot,
    ProgressTally, StatusLine,
};
pub use types::{
    Found, Keyspace, LengthReport, SearchOutcome, SearchReport, SearchState, SearchStatus,
};
