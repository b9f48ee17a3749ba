mod common;

use calboard::controller::{DateSelection, InteractionController};
use calboard::model::{Priority, SortBy};
use calboard::sync::{EventSync, IntentOutcome};
use chrono::NaiveDate;
use common::{Call, RecordingStore, ids, scenario_events};

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

#[tokio::test]
async fn compose_submit_adds_and_reloads() {
    let store = RecordingStore::with_events(scenario_events());
    let mut sync = EventSync::new(store.clone());
    sync.load().await;
    let mut ctl = InteractionController::new();

    ctl.select(DateSelection::day(jan(1)));
    for c in "New year".chars() {
        ctl.form_mut().enter_char(c);
    }
    ctl.form_mut().cycle_priority();

    assert_eq!(ctl.submit_to(&mut sync).await, Some(IntentOutcome::Applied));
    assert!(!ctl.is_form_open());
    assert_eq!(sync.events().len(), 3);

    let view = sync.sorted(SortBy::ByDate);
    assert_eq!(view[0].title, "New year");
    assert_eq!(view[0].priority, Priority::Medium);
    assert!(matches!(store.calls().last(), Some(Call::List)));
}

#[tokio::test]
async fn blank_submit_keeps_the_form_and_skips_the_store() {
    let store = RecordingStore::with_events(Vec::new());
    let mut sync = EventSync::new(store.clone());
    let mut ctl = InteractionController::new();

    ctl.select(DateSelection::day(jan(1)));
    assert_eq!(ctl.submit_to(&mut sync).await, None);
    assert!(ctl.is_form_open());
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn click_edit_and_delete_round_trip() {
    let store = RecordingStore::with_events(scenario_events());
    let mut sync = EventSync::new(store.clone());
    sync.load().await;
    let mut ctl = InteractionController::new();

    let a = sync.get("1").unwrap().clone();
    ctl.click(&a);
    ctl.form_mut().enter_char('!');
    ctl.form_mut().cycle_priority();
    ctl.form_mut().cycle_priority();
    assert_eq!(ctl.submit_to(&mut sync).await, Some(IntentOutcome::Applied));

    let a = sync.get("1").unwrap();
    assert_eq!(a.title, "A!");
    assert_eq!(a.priority, Priority::High);

    let b = sync.get("2").unwrap().clone();
    ctl.click(&b);
    assert_eq!(ctl.delete_to(&mut sync).await, Some(IntentOutcome::Applied));
    assert_eq!(ids(&sync.sorted(SortBy::ByPriority)), ["1"]);
    assert!(!ctl.is_form_open());
}

#[tokio::test]
async fn delete_to_is_a_no_op_while_composing() {
    let store = RecordingStore::with_events(scenario_events());
    let mut sync = EventSync::new(store.clone());
    let mut ctl = InteractionController::new();

    ctl.select(DateSelection::day(jan(2)));
    assert_eq!(ctl.delete_to(&mut sync).await, None);
    assert!(ctl.is_form_open());
    assert!(store.calls().is_empty());
}
