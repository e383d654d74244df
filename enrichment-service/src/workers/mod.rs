//! Background processing: trigger queue, batch processor, sweep scheduler.

pub mod processor;
pub mod queue;
pub mod scheduler;

pub use processor::{BatchProcessor, ProcessOutcome};
pub use queue::{ProcessingJob, ProcessingQueue};
pub use scheduler::spawn_sweep_scheduler;
