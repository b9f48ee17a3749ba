#![allow(dead_code)]

use async_trait::async_trait;
use calboard::error::{StoreError, StoreResult};
use calboard::model::{Event, EventPatch, EventTime, Priority};
use calboard::store::EventStore;
use calboard::sync::EventSurface;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Create(String),
    Update(String, EventPatch),
    Delete(String),
}

/// In-memory store that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    pub events: Mutex<Vec<Event>>,
    pub calls: Mutex<Vec<Call>>,
    pub fail_list: Mutex<bool>,
    pub fail_writes: Mutex<bool>,
}

impl RecordingStore {
    pub fn with_events(events: Vec<Event>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(events),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_fail_list(&self, fail: bool) {
        *self.fail_list.lock().unwrap() = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_writes(&self) -> StoreResult<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(StoreError::transport("backend unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for RecordingStore {
    async fn list(&self) -> StoreResult<Vec<Event>> {
        self.record(Call::List);
        if *self.fail_list.lock().unwrap() {
            return Err(StoreError::transport("connection refused"));
        }
        Ok(self.events.lock().unwrap().clone())
    }

    async fn create(&self, event: &Event) -> StoreResult<Event> {
        self.record(Call::Create(event.id.clone()));
        self.check_writes()?;
        self.events.lock().unwrap().push(event.clone());
        Ok(event.clone())
    }

    async fn update(&self, id: &str, patch: &EventPatch) -> StoreResult<Event> {
        self.record(Call::Update(id.to_string(), patch.clone()));
        self.check_writes()?;
        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::transport(format!("event `{id}` not found")))?;
        event.apply_patch(patch);
        Ok(event.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<Event> {
        self.record(Call::Delete(id.to_string()));
        self.check_writes()?;
        let mut events = self.events.lock().unwrap();
        let pos = events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| StoreError::transport(format!("event `{id}` not found")))?;
        Ok(events.remove(pos))
    }
}

/// Surface that keeps every list it was handed.
#[derive(Clone, Default)]
pub struct CapturingSurface {
    pub renders: Arc<Mutex<Vec<Vec<Event>>>>,
}

impl CapturingSurface {
    pub fn last_ids(&self) -> Option<Vec<String>> {
        self.renders
            .lock()
            .unwrap()
            .last()
            .map(|events| events.iter().map(|e| e.id.clone()).collect())
    }

    pub fn render_count(&self) -> usize {
        self.renders.lock().unwrap().len()
    }
}

impl EventSurface for CapturingSurface {
    fn events_changed(&self, events: &[Event]) {
        self.renders.lock().unwrap().push(events.to_vec());
    }
}

pub fn day(y: i32, m: u32, d: u32) -> EventTime {
    EventTime::date(y, m, d).unwrap()
}

/// A(2024-01-10, Low) with id "1", B(2024-01-05, High) with id "2".
pub fn scenario_events() -> Vec<Event> {
    vec![
        Event::new("1", "A", day(2024, 1, 10)),
        Event::new("2", "B", day(2024, 1, 5)).with_priority(Priority::High),
    ]
}

pub fn ids(events: &[&Event]) -> Vec<String> {
    events.iter().map(|e| e.id.clone()).collect()
}
