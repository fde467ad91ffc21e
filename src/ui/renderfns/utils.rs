use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Format an amount in dirhams, e.g. "1 250.00 DH"
pub fn format_money(amount: f64) -> String {
  let fixed = format!("{:.2}", amount.abs());
  let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

  let mut grouped = String::new();
  for (i, digit) in whole.chars().enumerate() {
    if i > 0 && (whole.len() - i) % 3 == 0 {
      grouped.push(' ');
    }
    grouped.push(digit);
  }

  let sign = if amount < 0.0 { "-" } else { "" };
  format!("{}{}.{} DH", sign, grouped, cents)
}

/// Display color for an outstanding balance
pub fn balance_color(remaining: f64) -> Color {
  if remaining > 0.0 {
    Color::Red
  } else {
    Color::Green
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Dévitalisation", 6), "Dév...");
  }

  #[test]
  fn test_format_money() {
    assert_eq!(format_money(0.0), "0.00 DH");
    assert_eq!(format_money(350.0), "350.00 DH");
    assert_eq!(format_money(1250.5), "1 250.50 DH");
    assert_eq!(format_money(1_000_000.0), "1 000 000.00 DH");
  }

  #[test]
  fn test_balance_color() {
    assert_eq!(balance_color(200.0), Color::Red);
    assert_eq!(balance_color(0.0), Color::Green);
  }
}
