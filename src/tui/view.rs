use crate::controller::ControllerState;
use crate::model::{Event, Priority};
use crate::tui::state::AppState;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Red),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::White),
    }
}

fn when(event: &Event) -> String {
    let Some(start) = event.start else {
        return "(no date)".to_string();
    };
    if event.all_day || start.is_date_only() {
        start.naive_date().format("%a %d %b %Y").to_string()
    } else {
        start.to_utc().format("%a %d %b %Y %H:%M UTC").to_string()
    }
}

fn selection_label(state: &AppState) -> String {
    let mut label = state.cursor_date.format("%Y-%m-%d").to_string();
    if state.range_days > 0 {
        label.push_str(&state.last_day().format("..%Y-%m-%d").to_string());
    }
    if let Some(time) = state.start_time {
        label.push_str(&time.format(" %H:%M").to_string());
    }
    label
}

pub fn draw(f: &mut Frame, state: &mut AppState) {
    let v_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(v_chunks[0]);

    // --- Event List ---
    let mut event_items: Vec<ListItem> = state
        .view_indices
        .iter()
        .map(|&idx| {
            let ev = &state.events[idx];
            let summary = format!("{:<24} [{}] {}", when(ev), ev.priority, ev.title);
            ListItem::new(Line::from(vec![Span::styled(
                summary,
                priority_style(ev.priority),
            )]))
        })
        .collect();
    if event_items.is_empty() && !state.loading {
        event_items.push(ListItem::new(Line::from(Span::styled(
            "No events scheduled",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let title = if state.loading {
        " Events (Loading...) ".to_string()
    } else {
        format!(
            " Events ({}) | by {} | {} ",
            state.view_indices.len(),
            state.sort_by.label(),
            selection_label(state)
        )
    };
    let event_list = List::new(event_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        );
    f.render_stateful_widget(event_list, main_chunks[0], &mut state.list_state);

    // --- Details Pane ---
    let details_text = match state.selected_event() {
        Some(ev) => {
            let end = ev
                .end
                .map(|e| e.to_string())
                .unwrap_or_else(|| "-".to_string());
            let start = ev
                .start
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!(
                "{}\nstart: {}  end: {}  all day: {}\npriority: {}  id: {}",
                ev.title,
                start,
                end,
                if ev.all_day { "yes" } else { "no" },
                ev.priority,
                ev.id
            )
        }
        None => String::new(),
    };
    let details = Paragraph::new(details_text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Details "));
    f.render_widget(details, main_chunks[1]);

    // --- Footer / Entry Form ---
    let footer_area = v_chunks[1];
    let form = state.controller.form();
    let form_title = match state.controller.state() {
        ControllerState::Idle => None,
        ControllerState::ComposingNew(sel) => Some((
            format!(" New event on {} | Tab: {} ", sel.start, form.priority),
            Color::Yellow,
        )),
        ControllerState::EditingExisting(_) => Some((
            format!(" Edit event | Tab: {} | Ctrl-d: Delete ", form.priority),
            Color::Magenta,
        )),
    };

    match form_title {
        Some((title, color)) => {
            let prefix = "> ";
            let input = Paragraph::new(format!("{}{}", prefix, form.title))
                .style(Style::default().fg(color))
                .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(input, footer_area);
            let cursor_x =
                footer_area.x + 1 + prefix.chars().count() as u16 + form.cursor() as u16;
            let cursor_y = footer_area.y + 1;
            f.set_cursor_position((cursor_x, cursor_y));
        }
        None => {
            let f_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(footer_area);
            let status = Paragraph::new(state.message.clone())
                .style(Style::default().fg(Color::Cyan))
                .block(
                    Block::default()
                        .borders(Borders::LEFT | Borders::TOP | Borders::BOTTOM)
                        .title(" Status "),
                );
            let help_text = "h/l:Day | </>:Range | t:Time | a:Add | Enter:Edit | s:Sort";
            let help = Paragraph::new(help_text)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Right)
                .block(
                    Block::default()
                        .borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
                        .title(" Actions "),
                );
            f.render_widget(status, f_chunks[0]);
            f.render_widget(help, f_chunks[1]);
        }
    }
}
