// File: ./src/model/event.rs
use crate::model::time::EventTime;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub type EventId = String;

/// Closed ordinal set, `1 | 2 | 3` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }

    /// Low -> Medium -> High -> Low, the order the entry form cycles through.
    pub fn cycle(self) -> Self {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            other => Err(format!("priority must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.ordinal()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Missing and `null` priorities both ingest as `Low`.
pub(crate) fn priority_or_low<'de, D>(deserializer: D) -> Result<Priority, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Priority>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, deserialize_with = "priority_or_low")]
    pub priority: Priority,
}

impl Event {
    pub fn new(id: impl Into<EventId>, title: impl Into<String>, start: EventTime) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start: Some(start),
            end: None,
            all_day: start.is_date_only(),
            priority: Priority::Low,
        }
    }

    pub fn with_end(mut self, end: EventTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sort key for date ordering; `None` sorts before every real date.
    pub fn start_millis(&self) -> Option<i64> {
        self.start.map(|s| s.timestamp_millis())
    }

    /// Applies the fields present in `patch`, leaving the others alone.
    pub fn apply_patch(&mut self, patch: &EventPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(start) = patch.start {
            self.start = Some(start);
        }
        if let Some(end) = patch.end {
            self.end = Some(end);
        }
        if let Some(all_day) = patch.all_day {
            self.all_day = all_day;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
    }
}

/// Partial update sent to `EventStore::update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<EventId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl EventPatch {
    /// `event` with a new title and priority, every other field carried as-is.
    ///
    /// Backends overwrite every column on update.
    pub fn retitled(event: &Event, title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: Some(event.id.clone()),
            title: Some(title.into()),
            start: event.start,
            end: event.end,
            all_day: Some(event.all_day),
            priority: Some(priority),
        }
    }

    /// The only fields the entry form can change after creation.
    pub fn title_and_priority(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: Some(title.into()),
            priority: Some(priority),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What the interaction layer hands to `EventSync::add`; the id is assigned there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEvent {
    pub title: String,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub all_day: bool,
    pub priority: Priority,
}

impl CandidateEvent {
    pub fn into_event(self, id: EventId) -> Event {
        Event {
            id,
            title: self.title,
            start: self.start,
            end: self.end,
            all_day: self.all_day,
            priority: self.priority,
        }
    }
}
