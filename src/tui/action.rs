use crate::model::Event;
use crate::sync::Intent;

#[derive(Debug)]
pub enum Action {
    Apply(Intent),
    Reload,
    Quit,
}

#[derive(Debug)]
pub enum AppEvent {
    EventsLoaded(Vec<Event>),
    Error(String),
    Status(String),
}
