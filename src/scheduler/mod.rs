//! Node-Local Scheduler Module
//!
//! The execution side of the cluster. Each worker node runs one
//! `TaskScheduler`: a bounded pool of workers pulling from a local queue,
//! invoking the external inference collaborator, obtaining a DACert from the
//! committee, and delivering the certified result through the retrying
//! submitter.
//!
//! Two independent retry ceilings apply: the submitter retries *transport*
//! failures of a single delivery with exponential backoff, while the
//! scheduler retries the *whole attempt* (execution plus delivery) up to its
//! own small ceiling before parking the task in the terminal failed list.

pub mod batch;
pub mod scheduler;
pub mod submitter;
pub mod types;

mod tests;

pub use batch::{dispatch_batch, BatchSummary, MAX_TASKS_PER_BATCH};
pub use scheduler::TaskScheduler;
pub use submitter::{RetryingSubmitter, SubmitterConfig};
pub use types::{InferenceFn, LocalTask, SchedulerConfig};
