// Derived views over the authoritative list
use crate::model::event::Event;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    ByDate,
    ByPriority,
}

impl SortBy {
    pub fn toggle(self) -> Self {
        match self {
            SortBy::ByDate => SortBy::ByPriority,
            SortBy::ByPriority => SortBy::ByDate,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortBy::ByDate => "Date",
            SortBy::ByPriority => "Priority",
        }
    }
}

/// Returns the events ordered by `by` without touching the input.
///
/// - `ByDate`: ascending start, events without a start first.
/// - `ByPriority`: High before Medium before Low.
///
/// Both orderings are stable, so ties keep their list order.
pub fn sorted_view(events: &[Event], by: SortBy) -> Vec<&Event> {
    let mut view: Vec<&Event> = events.iter().collect();
    match by {
        SortBy::ByDate => view.sort_by_key(|e| e.start_millis()),
        SortBy::ByPriority => view.sort_by(|a, b| b.priority.cmp(&a.priority)),
    }
    view
}

/// Same ordering as `sorted_view`, as indices into `events`.
pub fn sorted_indices(events: &[Event], by: SortBy) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..events.len()).collect();
    match by {
        SortBy::ByDate => indices.sort_by_key(|&i| events[i].start_millis()),
        SortBy::ByPriority => indices.sort_by(|&a, &b| events[b].priority.cmp(&events[a].priority)),
    }
    indices
}
