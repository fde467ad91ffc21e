//! Debounced search text and the "recent only" toggle.
//!
//! The controller holds no timer itself. `set_text` hands out a ticket, the
//! actor sleeps on it in a spawned task and posts it back, and `fire` only
//! accepts the newest ticket. Typing again before the delay elapses therefore
//! restarts the debounce.

use crate::remote::ParentFilter;

/// Tag for one armed debounce timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket(u64);

#[derive(Debug, Default)]
pub struct SearchController {
  text: String,
  recent_only: bool,
  /// Latest ticket handed out; older tickets are stale
  latest: u64,
  /// Whether `latest` has already fired or been invalidated
  settled: bool,
}

impl SearchController {
  pub fn new() -> Self {
    Self {
      settled: true,
      ..Self::default()
    }
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn recent_only(&self) -> bool {
    self.recent_only
  }

  /// Filter for the current text and toggle.
  pub fn filter(&self) -> ParentFilter {
    ParentFilter::new(self.text.clone(), self.recent_only)
  }

  /// Record new search text. Returns a ticket to arm the debounce timer with,
  /// or None when the text did not change.
  pub fn set_text(&mut self, text: impl Into<String>) -> Option<DebounceTicket> {
    let text = text.into();
    if text == self.text {
      return None;
    }
    self.text = text;
    self.latest += 1;
    self.settled = false;
    Some(DebounceTicket(self.latest))
  }

  /// The filter to reset with when `ticket`'s timer elapses, or None if a
  /// newer change superseded it.
  pub fn fire(&mut self, ticket: DebounceTicket) -> Option<ParentFilter> {
    if self.settled || ticket.0 != self.latest {
      return None;
    }
    self.settled = true;
    Some(self.filter())
  }

  /// Flip "recent only" and return the filter for an immediate reset.
  ///
  /// A pending debounce is dropped; the returned filter already carries the
  /// latest text.
  pub fn toggle_recent(&mut self) -> ParentFilter {
    self.recent_only = !self.recent_only;
    self.settled = true;
    self.filter()
  }
}
