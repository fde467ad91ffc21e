use crate::companion::{Activity, ErrorNotice, ViewState};
use crate::remote::ErrorKind;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::truncate;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// Hint shown under an error, depending on how it can be resolved
pub fn recovery_hint(notice: &ErrorNotice) -> &'static str {
  match notice.kind {
    ErrorKind::Network => "Press 'R' to retry.",
    ErrorKind::Auth => "Press 'L' to sign in.",
  }
}

/// Draw the patient list, newest first
pub fn draw_patient_list(
  frame: &mut Frame,
  area: Rect,
  view: &ViewState,
  list_state: &mut ListState,
  focused: bool,
) {
  let patients = view.patients();
  ensure_valid_selection(list_state, patients.items().len());

  let status = match patients.activity() {
    Activity::Loading => " (loading...)".to_string(),
    Activity::Refreshing => " (refreshing...)".to_string(),
    Activity::LoadingMore => " (loading more...)".to_string(),
    Activity::Idle if view.has_more() => " (more below)".to_string(),
    Activity::Idle => String::new(),
  };
  let title = format!(" Patients ({}){} ", patients.items().len(), status);

  let border = if focused { Color::Blue } else { Color::DarkGray };
  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));

  if patients.items().is_empty() {
    let (content, color) = if let Some(error) = patients.error() {
      (
        format!("{}\n\n{}", error.message, recovery_hint(error)),
        Color::Red,
      )
    } else if view.is_empty_result() {
      ("No patients match.".to_string(), Color::DarkGray)
    } else {
      ("Loading patients...".to_string(), Color::DarkGray)
    };
    let paragraph = Paragraph::new(content)
      .block(block)
      .wrap(Wrap { trim: true })
      .style(Style::default().fg(color));
    frame.render_widget(paragraph, area);
    return;
  }

  let mut items: Vec<ListItem> = patients
    .items()
    .iter()
    .map(|patient| {
      let line = Line::from(vec![
        Span::styled(
          format!("{:<28}", truncate(&patient.full_name(), 28)),
          Style::default().fg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::raw(format!(
          "{:<12}",
          truncate(patient.phone.as_deref().unwrap_or("-"), 12)
        )),
        Span::raw(" "),
        Span::styled(
          patient
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format!("{:<10}", "-")),
          Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
          truncate(patient.insurer.as_deref().unwrap_or(""), 10),
          Style::default().fg(Color::Yellow),
        ),
      ]);
      ListItem::new(line)
    })
    .collect();

  if let Some(error) = view.next_page_error() {
    items.push(ListItem::new(Line::styled(
      format!("  {} {}", error.message, recovery_hint(error)),
      Style::default().fg(Color::Red),
    )));
  }

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  frame.render_stateful_widget(list, area, list_state);
}
