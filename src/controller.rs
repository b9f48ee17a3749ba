// Gesture -> intent state machine behind the entry form
use crate::model::{CandidateEvent, Event, EventId, EventTime, Priority};
use crate::sync::{EventSync, Intent, IntentOutcome};
use chrono::{DateTime, Days, NaiveDate, Utc};

/// A range picked on the calendar surface. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSelection {
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub all_day: bool,
}

impl DateSelection {
    /// The whole of `date`, reported as `[date, date + 1)`.
    pub fn day(date: NaiveDate) -> Self {
        Self::days(date, date)
    }

    /// All-day span from `first` through `last`, reported as `[first, last + 1)`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        let last = last.max(first);
        Self {
            start: EventTime::Date(first),
            end: last.checked_add_days(Days::new(1)).map(EventTime::Date),
            all_day: true,
        }
    }

    /// A timed slot. `end` is clamped so it never precedes `start`.
    pub fn timed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: EventTime::from(start),
            end: Some(EventTime::from(end.max(start))),
            all_day: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ControllerState {
    #[default]
    Idle,
    ComposingNew(DateSelection),
    EditingExisting(EventId),
}

/// Title and priority being typed into the entry form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub title: String,
    pub priority: Priority,
    cursor: usize,
}

impl EntryForm {
    fn prefilled(title: &str, priority: Priority) -> Self {
        Self {
            title: title.to_string(),
            priority,
            cursor: title.chars().count(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn enter_char(&mut self, c: char) {
        let byte_idx = self.byte_index();
        self.title.insert(byte_idx, c);
        self.move_cursor_right();
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let before = self.title.chars().take(self.cursor - 1);
        let after = self.title.chars().skip(self.cursor);
        self.title = before.chain(after).collect();
        self.move_cursor_left();
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.clamp_cursor(self.cursor.saturating_sub(1));
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = self.clamp_cursor(self.cursor.saturating_add(1));
    }

    pub fn cycle_priority(&mut self) {
        self.priority = self.priority.cycle();
    }

    fn byte_index(&self) -> usize {
        self.title
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor)
            .unwrap_or(self.title.len())
    }

    fn clamp_cursor(&self, pos: usize) -> usize {
        pos.clamp(0, self.title.chars().count())
    }
}

#[derive(Debug, Default)]
pub struct InteractionController {
    state: ControllerState,
    form: EntryForm,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn form(&self) -> &EntryForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EntryForm {
        &mut self.form
    }

    pub fn is_form_open(&self) -> bool {
        self.state != ControllerState::Idle
    }

    /// Opens an empty form for a new event. Ignored while a form is open.
    pub fn select(&mut self, selection: DateSelection) -> bool {
        if self.is_form_open() {
            return false;
        }
        self.form = EntryForm::default();
        self.state = ControllerState::ComposingNew(selection);
        true
    }

    /// Opens the form pre-filled from `event`. Ignored while a form is open.
    pub fn click(&mut self, event: &Event) -> bool {
        if self.is_form_open() {
            return false;
        }
        self.form = EntryForm::prefilled(&event.title, event.priority);
        self.state = ControllerState::EditingExisting(event.id.clone());
        true
    }

    /// Turns the open form into an intent. A blank title keeps the form open.
    pub fn submit(&mut self) -> Option<Intent> {
        if self.form.title.trim().is_empty() {
            return None;
        }
        let title = self.form.title.trim().to_string();
        let priority = self.form.priority;
        let intent = match &self.state {
            ControllerState::Idle => return None,
            ControllerState::ComposingNew(selection) => Intent::Add(CandidateEvent {
                title,
                start: Some(selection.start),
                end: selection.end,
                all_day: selection.all_day,
                priority,
            }),
            ControllerState::EditingExisting(id) => Intent::Edit {
                id: id.clone(),
                title,
                priority,
            },
        };
        self.reset();
        Some(intent)
    }

    /// Only meaningful while editing an existing event.
    pub fn delete(&mut self) -> Option<Intent> {
        let ControllerState::EditingExisting(id) = &self.state else {
            return None;
        };
        let intent = Intent::Delete { id: id.clone() };
        self.reset();
        Some(intent)
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    pub async fn submit_to(&mut self, sync: &mut EventSync) -> Option<IntentOutcome> {
        let intent = self.submit()?;
        Some(sync.apply(intent).await)
    }

    pub async fn delete_to(&mut self, sync: &mut EventSync) -> Option<IntentOutcome> {
        let intent = self.delete()?;
        Some(sync.apply(intent).await)
    }

    fn reset(&mut self) {
        self.state = ControllerState::Idle;
        self.form = EntryForm::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn existing() -> Event {
        Event::new("7-Standup", "Standup", EventTime::Date(jan(3))).with_priority(Priority::Medium)
    }

    #[test]
    fn day_selection_is_exclusive_all_day_range() {
        let sel = DateSelection::day(jan(31));
        assert_eq!(sel.start, EventTime::Date(jan(31)));
        assert_eq!(sel.end, EventTime::date(2024, 2, 1));
        assert!(sel.all_day);
    }

    #[test]
    fn multi_day_and_timed_selections() {
        let span = DateSelection::days(jan(10), jan(12));
        assert_eq!(span.start, EventTime::Date(jan(10)));
        assert_eq!(span.end, EventTime::date(2024, 1, 13));
        assert!(span.all_day);

        let start = jan(10).and_hms_opt(9, 0, 0).unwrap().and_utc();
        let end = jan(10).and_hms_opt(10, 30, 0).unwrap().and_utc();
        let slot = DateSelection::timed(start, end);
        assert!(!slot.all_day);
        assert_eq!(slot.start.to_string(), "2024-01-10T09:00:00Z");
        assert_eq!(slot.end.map(|e| e.to_string()).as_deref(), Some("2024-01-10T10:30:00Z"));
    }

    #[test]
    fn select_opens_an_empty_low_priority_form() {
        let mut ctl = InteractionController::new();
        assert!(!ctl.is_form_open());
        assert!(ctl.select(DateSelection::day(jan(10))));
        assert!(ctl.is_form_open());
        assert_eq!(ctl.form().title, "");
        assert_eq!(ctl.form().priority, Priority::Low);
    }

    #[test]
    fn submit_new_event_yields_add_and_closes() {
        let mut ctl = InteractionController::new();
        ctl.select(DateSelection::day(jan(10)));
        for c in "Lunch".chars() {
            ctl.form_mut().enter_char(c);
        }
        ctl.form_mut().cycle_priority();
        ctl.form_mut().cycle_priority();

        let intent = ctl.submit().unwrap();
        assert_eq!(
            intent,
            Intent::Add(CandidateEvent {
                title: "Lunch".into(),
                start: EventTime::date(2024, 1, 10),
                end: EventTime::date(2024, 1, 11),
                all_day: true,
                priority: Priority::High,
            })
        );
        assert_eq!(ctl.state(), &ControllerState::Idle);
        assert_eq!(ctl.form(), &EntryForm::default());
    }

    #[test]
    fn blank_title_keeps_form_open() {
        let mut ctl = InteractionController::new();
        ctl.select(DateSelection::day(jan(10)));
        ctl.form_mut().enter_char(' ');
        assert_eq!(ctl.submit(), None);
        assert!(ctl.is_form_open());
    }

    #[test]
    fn click_prefills_and_submit_yields_edit() {
        let mut ctl = InteractionController::new();
        assert!(ctl.click(&existing()));
        assert_eq!(ctl.form().title, "Standup");
        assert_eq!(ctl.form().priority, Priority::Medium);

        ctl.form_mut().delete_char();
        ctl.form_mut().delete_char();
        assert_eq!(
            ctl.submit(),
            Some(Intent::Edit {
                id: "7-Standup".into(),
                title: "Stand".into(),
                priority: Priority::Medium,
            })
        );
        assert!(!ctl.is_form_open());
    }

    #[test]
    fn delete_only_while_editing() {
        let mut ctl = InteractionController::new();
        assert_eq!(ctl.delete(), None);

        ctl.select(DateSelection::day(jan(10)));
        assert_eq!(ctl.delete(), None);
        assert!(ctl.is_form_open());
        ctl.cancel();

        ctl.click(&existing());
        assert_eq!(
            ctl.delete(),
            Some(Intent::Delete {
                id: "7-Standup".into()
            })
        );
        assert!(!ctl.is_form_open());
    }

    #[test]
    fn gestures_are_ignored_while_a_form_is_open() {
        let mut ctl = InteractionController::new();
        ctl.click(&existing());
        assert!(!ctl.select(DateSelection::day(jan(10))));
        assert!(matches!(ctl.state(), ControllerState::EditingExisting(_)));
    }

    #[test]
    fn cancel_returns_to_idle_from_any_state() {
        let mut ctl = InteractionController::new();
        ctl.cancel();
        assert!(!ctl.is_form_open());
        ctl.select(DateSelection::day(jan(10)));
        ctl.form_mut().enter_char('x');
        ctl.cancel();
        assert!(!ctl.is_form_open());
        assert_eq!(ctl.form().title, "");
    }

    #[test]
    fn editing_handles_multibyte_titles() {
        let mut form = EntryForm::prefilled("Café", Priority::Low);
        form.move_cursor_left();
        form.enter_char('!');
        assert_eq!(form.title, "Caf!é");
        form.delete_char();
        assert_eq!(form.title, "Café");
    }
}
