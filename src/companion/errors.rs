//! Turns gateway failures into something the screen can show and act on.

use crate::remote::{ErrorKind, GatewayError, ParentFilter, PatientId};

/// The operation a retry control re-runs, with the arguments it first ran with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
  /// Reload the first page of the patient list with this filter
  ResetPatients(ParentFilter),
  /// Fetch the page after the last one loaded
  LoadNextPage,
  /// Fetch a patient's visits
  LoadVisits { patient_id: PatientId, bypass: bool },
}

/// User-facing error with an optional retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
  pub kind: ErrorKind,
  pub message: String,
  /// Technical detail for logs and the status line
  pub detail: String,
  /// None for auth failures; the auth provider handles those
  pub retry: Option<RetryAction>,
}

pub const UNAVAILABLE_MESSAGE: &str = "Data temporarily unavailable";
pub const SIGN_IN_MESSAGE: &str = "Your session is no longer valid. Sign in again.";

/// Classify a gateway failure for the operation described by `retry`.
pub fn classify(error: &GatewayError, retry: RetryAction) -> ErrorNotice {
  match error.kind() {
    ErrorKind::Network => ErrorNotice {
      kind: ErrorKind::Network,
      message: UNAVAILABLE_MESSAGE.to_string(),
      detail: error.to_string(),
      retry: Some(retry),
    },
    ErrorKind::Auth => ErrorNotice {
      kind: ErrorKind::Auth,
      message: SIGN_IN_MESSAGE.to_string(),
      detail: error.to_string(),
      retry: None,
    },
  }
}
