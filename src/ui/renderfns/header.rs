use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, backend, active filter, and shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, backend_url: &str, filter: &str) {
  let host = extract_host(backend_url);

  let mut spans = vec![
    Span::styled(" clinic ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", host), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", filter),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::raw("  "),
  ];

  // Shortcuts - keys highlighted, descriptions dimmed
  for (key, label) in [
    ("</>", " search"),
    ("<t>", " recent"),
    ("<r>", " refresh"),
    ("<R>", " retry"),
    ("<q>", " quit"),
  ] {
    spans.push(Span::styled(key, Style::default().fg(Color::Cyan)));
    spans.push(Span::styled(label, Style::default().fg(Color::DarkGray)));
    spans.push(Span::raw("   "));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// Extract host from the backend URL
fn extract_host(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
