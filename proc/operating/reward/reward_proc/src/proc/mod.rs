pub mod error;
pub mod job;
pub mod scheduler;
pub mod settings;
pub mod snapshot;

pub use error::{ProcError, Result};
pub use job::{JobKind, JobRunner, run_jobs};
pub use scheduler::run_schedule;
pub use settings::{ProcSettings, ScheduleSettings};
