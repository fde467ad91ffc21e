use thiserror::Error;

use super::api_types::ApiErrorBody;

/// Failures surfaced by the remote gateway and the auth provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
  #[error("Network error: {0}")]
  Network(String),

  #[error("Request timed out")]
  Timeout,

  #[error("Server returned {status}: {message}")]
  Server { status: u16, message: String },

  #[error("Failed to decode response: {0}")]
  Decode(String),

  #[error("Not signed in")]
  Unauthenticated,

  #[error("Authentication rejected ({status}): {message}")]
  Auth { status: u16, message: String },
}

/// Two-way classification used by the error classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Network,
  Auth,
}

impl GatewayError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Unauthenticated | Self::Auth { .. } => ErrorKind::Auth,
      Self::Network(_) | Self::Timeout | Self::Server { .. } | Self::Decode(_) => {
        ErrorKind::Network
      }
    }
  }

  /// Map an HTTP status and error body message to a gateway error.
  pub fn from_status(status: u16, message: String) -> Self {
    match status {
      401 | 403 => Self::Auth { status, message },
      _ => Self::Server { status, message },
    }
  }

  /// Build an error from a non-success response, reading its body.
  pub async fn from_response(response: reqwest::Response) -> Self {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Self::from_status(status, ApiErrorBody::message_from(&body))
  }
}

impl From<reqwest::Error> for GatewayError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      Self::Timeout
    } else if err.is_decode() {
      Self::Decode(err.to_string())
    } else {
      Self::Network(err.to_string())
    }
  }
}
