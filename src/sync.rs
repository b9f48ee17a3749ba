//! Event synchronization model.
//!
//! [`EventSync`] owns the authoritative in-memory list for a session. It sits
//! between intents coming from the interaction layer, the backing
//! [`EventStore`], the local [`SnapshotCache`] and whatever renders the list
//! ([`EventSurface`]).
//!
//! # Invariants
//! - Ids are unique within the list; duplicate ids arriving from the store or
//!   the snapshot are dropped on ingest (first one wins).
//! - The list only changes after the store accepted the operation, or on a
//!   successful load/hydrate.
//! - Every change is republished: snapshot first, then the surface, which
//!   always receives the full replacement list.
//! - Store failures never propagate as errors: they are logged and queued as
//!   [`Notice`]s, and the list stays as it was.

use crate::cache::SnapshotCache;
use crate::error::{StoreError, ValidationError};
use crate::model::{CandidateEvent, Event, EventId, EventPatch, Priority, SortBy, sorted_view};
use crate::store::EventStore;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Whatever renders the list. Gets the whole list on every change.
pub trait EventSurface: Send {
    fn events_changed(&self, events: &[Event]);
}

/// Normalized user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add(CandidateEvent),
    Edit {
        id: EventId,
        title: String,
        priority: Priority,
    },
    Delete {
        id: EventId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Applied,
    /// Dropped before reaching the store; nothing changed and nothing is shown.
    Rejected(ValidationError),
    /// The store refused or could not be reached; a notice was queued.
    Failed(StoreError),
}

impl IntentOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, IntentOutcome::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Hydrate,
    Load,
    Add,
    Edit,
    Remove,
}

impl Operation {
    fn verb(self) -> &'static str {
        match self {
            Operation::Hydrate => "restore saved events",
            Operation::Load => "load events",
            Operation::Add => "add event",
            Operation::Edit => "update event",
            Operation::Remove => "delete event",
        }
    }

    fn log_name(self) -> &'static str {
        match self {
            Operation::Hydrate => "hydrate",
            Operation::Load => "load",
            Operation::Add => "add",
            Operation::Edit => "edit",
            Operation::Remove => "remove",
        }
    }
}

/// User-visible, non-fatal message about a failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub operation: Operation,
    pub error: StoreError,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not {}: {}", self.operation.verb(), self.error)
    }
}

pub struct EventSync {
    store: Arc<dyn EventStore>,
    events: Vec<Event>,
    cache: Option<SnapshotCache>,
    surface: Option<Box<dyn EventSurface>>,
    notices: VecDeque<Notice>,
    refresh_generation: u64,
    loaded_generation: Option<u64>,
}

impl EventSync {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            events: Vec::new(),
            cache: None,
            surface: None,
            notices: VecDeque::new(),
            refresh_generation: 0,
            loaded_generation: None,
        }
    }

    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_surface(mut self, surface: impl EventSurface + 'static) -> Self {
        self.surface = Some(Box::new(surface));
        self
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn sorted(&self, by: SortBy) -> Vec<&Event> {
        sorted_view(&self.events, by)
    }

    pub fn refresh_generation(&self) -> u64 {
        self.refresh_generation
    }

    /// True until a load has succeeded since the last applied mutation.
    pub fn is_stale(&self) -> bool {
        self.loaded_generation != Some(self.refresh_generation)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Paints the saved snapshot, once, before the first load.
    pub fn hydrate(&mut self) -> IntentOutcome {
        if !self.events.is_empty() {
            return IntentOutcome::Applied;
        }
        let Some(cache) = &self.cache else {
            return IntentOutcome::Applied;
        };
        match cache.load() {
            Ok(events) => {
                info!(
                    "event=events_hydrate module=sync status=ok count={}",
                    events.len()
                );
                if events.is_empty() {
                    return IntentOutcome::Applied;
                }
                self.events = dedupe_by_id(events, Operation::Hydrate);
                self.notify_surface();
                IntentOutcome::Applied
            }
            Err(err) => {
                // An unreadable snapshot is a bad cached payload, same as a malformed one.
                self.fail(Operation::Hydrate, StoreError::decoding(err.to_string()))
            }
        }
    }

    /// Replaces the list with what the store holds now.
    pub async fn load(&mut self) -> IntentOutcome {
        match self.store.list().await {
            Ok(events) => {
                info!(
                    "event=events_load module=sync status=ok count={} generation={}",
                    events.len(),
                    self.refresh_generation
                );
                self.events = dedupe_by_id(events, Operation::Load);
                self.loaded_generation = Some(self.refresh_generation);
                self.publish();
                IntentOutcome::Applied
            }
            Err(err) => self.fail(Operation::Load, err),
        }
    }

    pub async fn reload_if_stale(&mut self) -> IntentOutcome {
        if self.is_stale() {
            self.load().await
        } else {
            IntentOutcome::Applied
        }
    }

    pub async fn add(&mut self, candidate: CandidateEvent) -> IntentOutcome {
        let mut candidate = candidate;
        candidate.title = candidate.title.trim().to_string();
        if candidate.title.is_empty() {
            return IntentOutcome::Rejected(ValidationError::EmptyTitle);
        }
        let Some(start) = candidate.start else {
            return IntentOutcome::Rejected(ValidationError::MissingStart);
        };
        if let Some(end) = candidate.end
            && end.timestamp_millis() < start.timestamp_millis()
        {
            return IntentOutcome::Rejected(ValidationError::EndBeforeStart);
        }

        let id = self.next_id(&candidate.title);
        let event = candidate.into_event(id);
        match self.store.create(&event).await {
            Ok(_) => {
                debug!("event=event_add module=sync status=ok id={}", event.id);
                self.events.push(event);
                self.mark_changed();
                IntentOutcome::Applied
            }
            Err(err) => self.fail(Operation::Add, err),
        }
    }

    /// Changes title and priority; dates and `allDay` are sent back unchanged.
    pub async fn edit(&mut self, id: &str, title: &str, priority: Priority) -> IntentOutcome {
        let title = title.trim();
        if title.is_empty() {
            return IntentOutcome::Rejected(ValidationError::EmptyTitle);
        }
        let Some(existing) = self.get(id) else {
            return IntentOutcome::Rejected(ValidationError::UnknownEvent(id.to_string()));
        };

        let patch = EventPatch::retitled(existing, title, priority);
        match self.store.update(id, &patch).await {
            Ok(_) => {
                debug!("event=event_edit module=sync status=ok id={id}");
                if let Some(existing) = self.events.iter_mut().find(|e| e.id == id) {
                    existing.apply_patch(&patch);
                }
                self.mark_changed();
                IntentOutcome::Applied
            }
            Err(err) => self.fail(Operation::Edit, err),
        }
    }

    pub async fn remove(&mut self, id: &str) -> IntentOutcome {
        if self.get(id).is_none() {
            return IntentOutcome::Rejected(ValidationError::UnknownEvent(id.to_string()));
        }
        match self.store.delete(id).await {
            Ok(_) => {
                debug!("event=event_remove module=sync status=ok id={id}");
                self.events.retain(|e| e.id != id);
                self.mark_changed();
                IntentOutcome::Applied
            }
            Err(err) => self.fail(Operation::Remove, err),
        }
    }

    /// Runs the intent, then reloads from the store if it went through.
    pub async fn apply(&mut self, intent: Intent) -> IntentOutcome {
        let outcome = match intent {
            Intent::Add(candidate) => self.add(candidate).await,
            Intent::Edit {
                id,
                title,
                priority,
            } => self.edit(&id, &title, priority).await,
            Intent::Delete { id } => self.remove(&id).await,
        };
        if outcome.is_applied() {
            self.load().await;
        }
        outcome
    }

    /// `<epoch-millis>-<title>`, nudged forward until it is unused.
    fn next_id(&self, title: &str) -> EventId {
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let id = format!("{millis}-{title}");
            if self.get(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }

    fn mark_changed(&mut self) {
        self.refresh_generation += 1;
        self.publish();
    }

    fn publish(&mut self) {
        if let Some(cache) = &self.cache
            && let Err(e) = cache.save(&self.events)
        {
            warn!("event=snapshot_save module=sync status=error error={e}");
        }
        self.notify_surface();
    }

    fn notify_surface(&self) {
        if let Some(surface) = &self.surface {
            surface.events_changed(&self.events);
        }
    }

    fn fail(&mut self, operation: Operation, error: StoreError) -> IntentOutcome {
        warn!(
            "event=events_{} module=sync status=error error={error}",
            operation.log_name()
        );
        self.notices.push_back(Notice {
            operation,
            error: error.clone(),
        });
        IntentOutcome::Failed(error)
    }
}

fn dedupe_by_id(events: Vec<Event>, operation: Operation) -> Vec<Event> {
    let total = events.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<Event> = events
        .into_iter()
        .filter(|e| seen.insert(e.id.clone()))
        .collect();
    if unique.len() != total {
        warn!(
            "event=events_{} module=sync status=duplicate_ids dropped={}",
            operation.log_name(),
            total - unique.len()
        );
    }
    unique
}

impl fmt::Debug for EventSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSync")
            .field("events", &self.events.len())
            .field("cache", &self.cache)
            .field("notices", &self.notices.len())
            .field("refresh_generation", &self.refresh_generation)
            .finish()
    }
}
