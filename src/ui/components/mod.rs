mod input;
mod search_input;

pub use search_input::{SearchEvent, SearchInput};

/// Outcome of offering a key to a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the caller to do
  Handled,
  /// Consumed, with an event for the caller
  Event(T),
  /// Not consumed; try the next handler
  NotHandled,
}
