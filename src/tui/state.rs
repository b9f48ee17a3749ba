use crate::controller::{DateSelection, InteractionController};
use crate::model::{Event, SortBy, sorted_indices};
use chrono::{Days, Local, NaiveDate, NaiveTime, TimeDelta};
use ratatui::widgets::ListState;

pub struct AppState {
    pub events: Vec<Event>,
    pub view_indices: Vec<usize>,
    pub sort_by: SortBy,
    pub list_state: ListState,
    pub cursor_date: NaiveDate,
    /// Extra days the pending selection covers past `cursor_date`.
    pub range_days: u64,
    /// Start of a timed selection; `None` selects whole days.
    pub start_time: Option<NaiveTime>,
    pub controller: InteractionController,
    pub message: String,
    pub loading: bool,
}

impl AppState {
    pub fn new(sort_by: SortBy) -> Self {
        let mut l_state = ListState::default();
        l_state.select(Some(0));
        Self {
            events: vec![],
            view_indices: vec![],
            sort_by,
            list_state: l_state,
            cursor_date: Local::now().date_naive(),
            range_days: 0,
            start_time: None,
            controller: InteractionController::new(),
            message: "a: Add | Enter: Edit | s: Sort | r: Reload | q: Quit".to_string(),
            loading: true,
        }
    }

    pub fn set_events(&mut self, events: Vec<Event>) {
        self.events = events;
        self.recalculate_view();
    }

    pub fn toggle_sort(&mut self) {
        self.sort_by = self.sort_by.toggle();
        self.recalculate_view();
    }

    pub fn recalculate_view(&mut self) {
        self.view_indices = sorted_indices(&self.events, self.sort_by);
        let sel = self.list_state.selected().unwrap_or(0);
        if self.view_indices.is_empty() {
            self.list_state.select(Some(0));
        } else if sel >= self.view_indices.len() {
            self.list_state.select(Some(self.view_indices.len() - 1));
        }
    }

    pub fn selected_event(&self) -> Option<&Event> {
        let view_idx = self.list_state.selected()?;
        let idx = *self.view_indices.get(view_idx)?;
        self.events.get(idx)
    }

    pub fn next(&mut self) {
        let len = self.view_indices.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.view_indices.len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn shift_day(&mut self, days: i64) {
        let step = Days::new(days.unsigned_abs());
        let moved = if days >= 0 {
            self.cursor_date.checked_add_days(step)
        } else {
            self.cursor_date.checked_sub_days(step)
        };
        if let Some(date) = moved {
            self.cursor_date = date;
        }
    }

    pub fn extend_range(&mut self, days: i64) {
        self.range_days = self.range_days.saturating_add_signed(days);
    }

    /// Switches between whole days and a timed slot starting at 09:00.
    pub fn toggle_timed(&mut self) {
        self.start_time = match self.start_time {
            Some(_) => None,
            None => NaiveTime::from_hms_opt(9, 0, 0),
        };
    }

    /// Moves the start of a timed selection, wrapping within the day.
    pub fn shift_time(&mut self, minutes: i64) {
        if let Some(time) = self.start_time {
            self.start_time = Some(time.overflowing_add_signed(TimeDelta::minutes(minutes)).0);
        }
    }

    pub fn last_day(&self) -> NaiveDate {
        self.cursor_date
            .checked_add_days(Days::new(self.range_days))
            .unwrap_or(self.cursor_date)
    }

    /// What `a` would select right now. A timed slot starts on the cursor day
    /// and ends an hour past the same time on the last day, in UTC.
    pub fn pending_selection(&self) -> DateSelection {
        match self.start_time {
            None => DateSelection::days(self.cursor_date, self.last_day()),
            Some(time) => {
                let start = self.cursor_date.and_time(time).and_utc();
                let end = self.last_day().and_time(time).and_utc() + TimeDelta::hours(1);
                DateSelection::timed(start, end)
            }
        }
    }

    /// Opens the entry form for the pending selection and resets the range.
    pub fn compose_on_cursor(&mut self) -> bool {
        let opened = self.controller.select(self.pending_selection());
        if opened {
            self.range_days = 0;
        }
        opened
    }

    /// Opens the entry form for the highlighted event.
    pub fn edit_selected(&mut self) -> bool {
        let Some(event) = self.selected_event().cloned() else {
            return false;
        };
        self.controller.click(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventTime, Priority};
    use crate::sync::Intent;

    fn state_with_events() -> AppState {
        let mut state = AppState::new(SortBy::ByDate);
        state.set_events(vec![
            Event::new("1", "A", EventTime::date(2024, 1, 10).unwrap()),
            Event::new("2", "B", EventTime::date(2024, 1, 5).unwrap())
                .with_priority(Priority::High),
        ]);
        state
    }

    #[test]
    fn selection_follows_the_sorted_view() {
        let mut state = state_with_events();
        assert_eq!(state.selected_event().unwrap().id, "2");
        state.next();
        assert_eq!(state.selected_event().unwrap().id, "1");
        state.next();
        assert_eq!(state.selected_event().unwrap().id, "2");
        state.previous();
        assert_eq!(state.selected_event().unwrap().id, "1");
    }

    #[test]
    fn selection_is_clamped_when_the_list_shrinks() {
        let mut state = state_with_events();
        state.list_state.select(Some(1));
        state.set_events(vec![Event::new(
            "1",
            "A",
            EventTime::date(2024, 1, 10).unwrap(),
        )]);
        assert_eq!(state.list_state.selected(), Some(0));
    }

    #[test]
    fn edit_selected_prefills_the_form() {
        let mut state = state_with_events();
        assert!(state.edit_selected());
        assert_eq!(state.controller.form().title, "B");
        assert_eq!(state.controller.form().priority, Priority::High);
    }

    #[test]
    fn compose_uses_the_cursor_day() {
        let mut state = AppState::new(SortBy::ByDate);
        state.cursor_date = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        state.shift_day(2);
        assert_eq!(state.cursor_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(state.compose_on_cursor());
        assert!(state.controller.is_form_open());
    }

    #[test]
    fn multi_day_selection_reaches_the_add_intent() {
        let mut state = AppState::new(SortBy::ByDate);
        state.cursor_date = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        state.extend_range(3);
        assert_eq!(state.last_day(), NaiveDate::from_ymd_opt(2024, 2, 2).unwrap());
        assert!(state.compose_on_cursor());
        assert_eq!(state.range_days, 0);

        for c in "Offsite".chars() {
            state.controller.form_mut().enter_char(c);
        }
        match state.controller.submit() {
            Some(Intent::Add(candidate)) => {
                assert_eq!(candidate.title, "Offsite");
                assert_eq!(candidate.start, EventTime::date(2024, 1, 30));
                assert_eq!(candidate.end, EventTime::date(2024, 2, 3));
                assert!(candidate.all_day);
            }
            other => panic!("expected an add intent, got {other:?}"),
        }
    }

    #[test]
    fn timed_selection_is_not_all_day() {
        let mut state = AppState::new(SortBy::ByDate);
        state.cursor_date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        state.shift_time(30);
        assert_eq!(state.start_time, None);
        state.toggle_timed();
        state.shift_time(-30);
        assert_eq!(state.start_time, NaiveTime::from_hms_opt(8, 30, 0));

        let selection = state.pending_selection();
        assert!(!selection.all_day);
        assert_eq!(selection.start.to_string(), "2024-01-10T08:30:00Z");
        assert_eq!(
            selection.end.map(|e| e.to_string()).as_deref(),
            Some("2024-01-10T09:30:00Z")
        );
    }

    #[test]
    fn range_never_goes_below_a_single_day() {
        let mut state = AppState::new(SortBy::ByDate);
        state.extend_range(-2);
        assert_eq!(state.range_days, 0);
        assert_eq!(state.last_day(), state.cursor_date);
    }
}
