//! Background task runtime

mod reclaim;
mod scheduler;
mod verify;

pub use reclaim::ReclaimExpiredTask;
pub use scheduler::{ScheduledTask, Scheduler, Task};
pub use verify::{check_mint, MintMismatch, Rejection, Verdict, VerifyContentTask};
