// File: ./src/model/mod.rs
// Aggregates the split model files
pub mod event;
pub mod sort;
pub mod time;

pub use event::{CandidateEvent, Event, EventId, EventPatch, Priority};
pub use sort::{SortBy, sorted_indices, sorted_view};
pub use time::{EventTime, InvalidEventTime};
