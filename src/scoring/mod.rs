// Scoring layer — pure functions that turn share events into scores.
//
// Nothing in here touches the database. The pipeline fetches events, calls
// these functions, and writes results back, which keeps every formula
// independently testable with frozen inputs.

pub mod coefficient;
pub mod params;
pub mod ranking;
pub mod trending;
pub mod weights;
