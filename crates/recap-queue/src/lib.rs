pub mod error;
pub mod job;
pub mod traits;
pub mod memory;
pub mod events;
pub mod worker;

#[cfg(feature = "mongodb")]
pub mod mongo;

pub use error::{QueueError, Result};
pub use job::{Job, JobSettings, JobState};
pub use traits::JobQueue;
pub use memory::InMemoryQueue;
pub use events::JobEvent;
pub use worker::{HandlerError, JobHandler, ProgressReporter, Worker, WorkerConfig};

#[cfg(feature = "mongodb")]
pub use mongo::MongoJobQueue;
