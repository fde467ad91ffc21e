//! Session provider consumed by the gateway.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use std::sync::RwLock;
use tracing::{info, warn};
use url::Url;

use super::api_types::{ApiErrorBody, ApiTokenResponse};
use super::error::GatewayError;

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub access_token: String,
  pub email: String,
  pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|at| at <= now)
  }
}

/// Source of the session every gateway call runs under.
#[async_trait]
pub trait AuthProvider: Send + Sync {
  /// The live session, or None when signed out or expired.
  fn current_session(&self) -> Option<Session>;

  async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError>;

  async fn sign_out(&self);
}

/// Auth provider backed by the Supabase auth server (password grant).
pub struct SupabaseAuth {
  http: reqwest::Client,
  token_url: Url,
  logout_url: Url,
  anon_key: String,
  session: RwLock<Option<Session>>,
}

impl SupabaseAuth {
  pub fn new(http: reqwest::Client, base_url: &str, anon_key: String) -> Result<Self> {
    let base = base_url.trim_end_matches('/');
    let mut token_url = Url::parse(&format!("{}/auth/v1/token", base))
      .map_err(|e| eyre!("Invalid Supabase URL {}: {}", base_url, e))?;
    token_url
      .query_pairs_mut()
      .append_pair("grant_type", "password");
    let logout_url = Url::parse(&format!("{}/auth/v1/logout", base))
      .map_err(|e| eyre!("Invalid Supabase URL {}: {}", base_url, e))?;

    Ok(Self {
      http,
      token_url,
      logout_url,
      anon_key,
      session: RwLock::new(None),
    })
  }

  fn replace_session(&self, session: Option<Session>) -> Option<Session> {
    match self.session.write() {
      Ok(mut guard) => std::mem::replace(&mut *guard, session),
      Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), session),
    }
  }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
  fn current_session(&self) -> Option<Session> {
    let guard = match self.session.read() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    guard
      .as_ref()
      .filter(|session| !session.is_expired(Utc::now()))
      .cloned()
  }

  async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
    let body = serde_json::json!({
      "email": email,
      "password": password,
    });

    let response = self
      .http
      .post(self.token_url.clone())
      .header("apikey", &self.anon_key)
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      // The auth server answers bad credentials with 400
      let text = response.text().await.unwrap_or_default();
      return Err(GatewayError::Auth {
        status: status.as_u16(),
        message: ApiErrorBody::message_from(&text),
      });
    }

    let token: ApiTokenResponse = response.json().await?;
    let session = Session {
      access_token: token.access_token,
      email: token
        .user
        .and_then(|u| u.email)
        .unwrap_or_else(|| email.to_string()),
      expires_at: token
        .expires_in
        .map(|secs| Utc::now() + Duration::seconds(secs)),
    };

    info!(email = %session.email, "signed in");
    self.replace_session(Some(session.clone()));
    Ok(session)
  }

  async fn sign_out(&self) {
    let Some(session) = self.replace_session(None) else {
      return;
    };

    let result = self
      .http
      .post(self.logout_url.clone())
      .header("apikey", &self.anon_key)
      .bearer_auth(&session.access_token)
      .send()
      .await;

    match result {
      Ok(response) if response.status().is_success() => info!("signed out"),
      Ok(response) => warn!(status = %response.status(), "remote sign-out rejected"),
      Err(e) => warn!(error = %e, "remote sign-out failed"),
    }
  }
}

/// Auth provider with a fixed session, for the in-memory roster.
pub struct StaticAuth {
  session: RwLock<Option<Session>>,
}

impl StaticAuth {
  pub fn signed_in(email: &str) -> Self {
    Self {
      session: RwLock::new(Some(Session {
        access_token: "local".to_string(),
        email: email.to_string(),
        expires_at: None,
      })),
    }
  }

  #[cfg(test)]
  pub fn signed_out() -> Self {
    Self {
      session: RwLock::new(None),
    }
  }
}

#[async_trait]
impl AuthProvider for StaticAuth {
  fn current_session(&self) -> Option<Session> {
    self.session.read().ok().and_then(|guard| guard.clone())
  }

  async fn sign_in(&self, email: &str, _password: &str) -> Result<Session, GatewayError> {
    let session = Session {
      access_token: "local".to_string(),
      email: email.to_string(),
      expires_at: None,
    };
    if let Ok(mut guard) = self.session.write() {
      *guard = Some(session.clone());
    }
    Ok(session)
  }

  async fn sign_out(&self) {
    if let Ok(mut guard) = self.session.write() {
      *guard = None;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_session_expiry() {
    let now = Utc::now();
    let session = Session {
      access_token: "t".into(),
      email: "a@b.c".into(),
      expires_at: Some(now - Duration::seconds(1)),
    };
    assert!(session.is_expired(now));

    let open_ended = Session {
      expires_at: None,
      ..session
    };
    assert!(!open_ended.is_expired(now));
  }

  #[test]
  fn test_token_url_carries_grant_type() {
    let auth = SupabaseAuth::new(
      reqwest::Client::new(),
      "https://abcd.supabase.co/",
      "anon".into(),
    )
    .unwrap();
    assert_eq!(
      auth.token_url.as_str(),
      "https://abcd.supabase.co/auth/v1/token?grant_type=password"
    );
    assert!(auth.current_session().is_none());
  }

  #[tokio::test]
  async fn test_static_auth_sign_out_clears_session() {
    let auth = StaticAuth::signed_in("desk@clinic.example");
    assert!(auth.current_session().is_some());
    auth.sign_out().await;
    assert!(auth.current_session().is_none());
    auth.sign_in("desk@clinic.example", "").await.unwrap();
    assert!(auth.current_session().is_some());
  }
}
