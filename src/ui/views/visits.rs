use crate::cache::CacheSource;
use crate::companion::{Activity, ViewState};
use crate::remote::Patient;
use crate::ui::renderfns::{balance_color, format_money, truncate};
use crate::ui::views::patients::recovery_hint;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

/// Draw the selected patient's visits with running totals
pub fn draw_visit_panel(frame: &mut Frame, area: Rect, view: &ViewState, patient: &Patient) {
  let visits = view.visits();

  let status = match (visits.activity(), view.visits_source()) {
    (Activity::Loading, _) => " (loading...)".to_string(),
    (Activity::Refreshing, _) => " (refreshing...)".to_string(),
    (_, Some((CacheSource::Cache, at))) => {
      format!(" (cached {})", at.with_timezone(&chrono::Local).format("%H:%M"))
    }
    _ => String::new(),
  };

  let block = Block::default()
    .title(format!(" {}{} ", patient.full_name(), status))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(2), // Patient details
      Constraint::Min(1),    // Visits
      Constraint::Length(1), // Error line
      Constraint::Length(1), // Totals
    ])
    .split(inner);

  let details = vec![
    Line::from(vec![
      Span::styled("Phone: ", Style::default().fg(Color::DarkGray)),
      Span::raw(patient.phone.as_deref().unwrap_or("-")),
      Span::styled("   Born: ", Style::default().fg(Color::DarkGray)),
      Span::raw(patient.birth_date.as_deref().unwrap_or("-")),
    ]),
    Line::from(vec![
      Span::styled("Profession: ", Style::default().fg(Color::DarkGray)),
      Span::raw(patient.profession.as_deref().unwrap_or("-")),
      Span::styled("   Insurance: ", Style::default().fg(Color::DarkGray)),
      Span::raw(patient.insurer.as_deref().unwrap_or("-")),
    ]),
  ];
  frame.render_widget(Paragraph::new(details), chunks[0]);

  if visits.items().is_empty() {
    let content = match visits.activity() {
      Activity::Idle if visits.error().is_none() => "No visits recorded.",
      Activity::Idle => "",
      _ => "Loading visits...",
    };
    frame.render_widget(
      Paragraph::new(content).style(Style::default().fg(Color::DarkGray)),
      chunks[1],
    );
  } else {
    let items: Vec<ListItem> = visits
      .items()
      .iter()
      .map(|visit| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<10}", truncate(&visit.date, 10)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(format!(
            " {:>3} ",
            visit.tooth.as_deref().unwrap_or("")
          )),
          Span::raw(format!(
            "{:<18}",
            truncate(visit.procedure.as_deref().unwrap_or("-"), 18)
          )),
          Span::raw(format!("{:>14}", format_money(visit.total))),
          Span::styled(
            format!("{:>14}", format_money(visit.remaining)),
            Style::default().fg(balance_color(visit.remaining)),
          ),
        ]))
      })
      .collect();
    frame.render_widget(List::new(items), chunks[1]);
  }

  if let Some(error) = visits.error() {
    let line = Paragraph::new(format!("{} {}", error.message, recovery_hint(error)))
      .wrap(Wrap { trim: true })
      .style(Style::default().fg(Color::Red));
    frame.render_widget(line, chunks[2]);
  }

  let totals = view.visit_totals();
  let summary = Line::from(vec![
    Span::styled("Total ", Style::default().fg(Color::DarkGray)),
    Span::raw(format_money(totals.total)),
    Span::styled("  Paid ", Style::default().fg(Color::DarkGray)),
    Span::raw(format_money(totals.paid)),
    Span::styled("  Due ", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format_money(totals.remaining),
      Style::default()
        .fg(balance_color(totals.remaining))
        .add_modifier(Modifier::BOLD),
    ),
    Span::styled(
      format!("  ({} unpaid)", totals.unpaid_visits),
      Style::default().fg(Color::DarkGray),
    ),
  ]);
  frame.render_widget(Paragraph::new(summary), chunks[3]);
}
