pub mod message;
pub mod scheduler;
pub mod worker;

pub use message::{WorkerCommand, WorkerOutcome, WorkerResponse};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use worker::{Worker, WorkerTasks};
