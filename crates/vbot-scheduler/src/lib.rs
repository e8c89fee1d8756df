//! Trade-cycle scheduler for vbot.
//!
//! The scheduler walks the flattened (cycle, wallet) unit sequence, one unit
//! at a time: sample a size and price bump, buy, wait, sell, account, and
//! stop early on a volume cap or an external stop request. Silent pauses
//! replace a few randomly chosen units.

pub mod error;
pub mod front_load;
pub mod pause;
pub mod scheduler;
pub mod state;
pub mod summary;

pub use error::{SchedulerError, SchedulerResult};
pub use pause::PauseSchedule;
pub use scheduler::VolumeScheduler;
pub use state::{CompletionCause, RunSnapshot, SchedulerState, StopHandle};
pub use summary::RunSummary;
