pub mod components;
mod renderfns;
mod views;

use crate::app::App;
use crate::companion::{Activity, ViewState};
use ratatui::prelude::*;
use ratatui::widgets::{ListState, Paragraph};

/// Keep the list selection inside `0..len`
pub fn ensure_valid_selection(state: &mut ListState, len: usize) {
  match state.selected() {
    _ if len == 0 => state.select(None),
    None => state.select(Some(0)),
    Some(i) if i >= len => state.select(Some(len - 1)),
    Some(_) => {}
  }
}

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let filter = filter_label(app.search_text(), app.recent_only());
  renderfns::draw_header(frame, chunks[0], app.backend_url(), &filter);

  let (view, list_state) = app.list_parts();
  match view.selected() {
    Some(patient) => {
      let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);
      views::draw_patient_list(frame, body[0], view, list_state, false);
      views::draw_visit_panel(frame, body[1], view, patient);
    }
    None => views::draw_patient_list(frame, chunks[1], view, list_state, true),
  }

  let (content, style) = status_line(app.companion().view(), app.notice());
  frame.render_widget(Paragraph::new(content).style(style), chunks[2]);

  app.search().render_overlay(frame, chunks[1]);
}

fn filter_label(text: &str, recent_only: bool) -> String {
  let scope = if recent_only { "last 30 days" } else { "all patients" };
  match text.trim() {
    "" => scope.to_string(),
    term => format!("{} matching \"{}\"", scope, term),
  }
}

fn status_line(view: &ViewState, notice: Option<&str>) -> (String, Style) {
  if let Some(notice) = notice {
    return (format!(" {}", notice), Style::default().fg(Color::Yellow));
  }

  let error = view
    .visits()
    .error()
    .or(view.next_page_error())
    .or(view.patients().error());
  if let Some(error) = error {
    return (
      format!(" {} ({})", error.message, error.detail),
      Style::default().fg(Color::Red),
    );
  }

  if view.patients().activity() != Activity::Idle || view.visits().is_busy() {
    return (" Loading...".to_string(), Style::default().fg(Color::Cyan));
  }

  (
    " j/k:nav  Enter:open  Esc:close  m:more  r:refresh  R:retry  t:recent  L:sign in  q:quit"
      .to_string(),
    Style::default().fg(Color::DarkGray),
  )
}
