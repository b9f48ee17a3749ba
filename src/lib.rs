pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;
pub mod sync;

#[cfg(feature = "tui")]
pub mod tui;

pub use controller::{DateSelection, InteractionController};
pub use error::{StoreError, StoreResult, ValidationError};
pub use model::{Event, EventPatch, EventTime, Priority, SortBy};
pub use store::EventStore;
pub use sync::{EventSurface, EventSync, Intent, IntentOutcome};
