// Pipeline layer — the batch recalculation run and the scheduler loop.

pub mod recalc;
pub mod watch;

pub use recalc::{RunOutcome, RunSummary};
