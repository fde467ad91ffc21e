use async_trait::async_trait;
use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::api_types::{ApiPatient, ApiVisit};
use super::auth::AuthProvider;
use super::error::GatewayError;
use super::gateway::RemoteGateway;
use super::query::{self, ParentFilter, PATIENT_TABLE, VISIT_TABLE};
use super::types::{Patient, PatientId, Visit};

/// Build the shared HTTP client; the transport owns request timeouts.
pub fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
  reqwest::Client::builder()
    .user_agent(concat!("clinic-companion/", env!("CARGO_PKG_VERSION")))
    .timeout(timeout)
    .build()
    .map_err(|e| eyre!("Failed to create HTTP client: {}", e))
}

/// Gateway reading the clinic tables through the Supabase REST endpoint
#[derive(Clone)]
pub struct SupabaseGateway {
  http: reqwest::Client,
  rest_url: Url,
  anon_key: String,
  auth: Arc<dyn AuthProvider>,
}

impl SupabaseGateway {
  pub fn new(
    http: reqwest::Client,
    base_url: &str,
    anon_key: String,
    auth: Arc<dyn AuthProvider>,
  ) -> Result<Self> {
    let rest_url = Url::parse(&format!("{}/rest/v1/", base_url.trim_end_matches('/')))
      .map_err(|e| eyre!("Invalid Supabase URL {}: {}", base_url, e))?;

    Ok(Self {
      http,
      rest_url,
      anon_key,
      auth,
    })
  }

  fn table_url(&self, table: &str, params: &[(String, String)]) -> Result<Url, GatewayError> {
    let mut url = self
      .rest_url
      .join(table)
      .map_err(|e| GatewayError::Network(format!("Invalid table URL: {}", e)))?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url)
  }

  /// GET rows from a table under the current session.
  async fn get_rows<T: DeserializeOwned>(
    &self,
    table: &str,
    params: &[(String, String)],
  ) -> Result<Vec<T>, GatewayError> {
    // No request goes out without a session
    let session = self
      .auth
      .current_session()
      .ok_or(GatewayError::Unauthenticated)?;

    let url = self.table_url(table, params)?;
    debug!(%url, "remote read");

    let response = self
      .http
      .get(url)
      .header("apikey", &self.anon_key)
      .header("Accept", "application/json")
      .bearer_auth(&session.access_token)
      .send()
      .await?;

    if !response.status().is_success() {
      return Err(GatewayError::from_response(response).await);
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(e.to_string()))
  }
}

#[async_trait]
impl RemoteGateway for SupabaseGateway {
  async fn fetch_parents(
    &self,
    filter: &ParentFilter,
    page: usize,
  ) -> Result<Vec<Patient>, GatewayError> {
    let params = query::patient_query(filter, page, Utc::now());
    let rows: Vec<ApiPatient> = self.get_rows(PATIENT_TABLE, &params).await?;
    Ok(rows.into_iter().map(ApiPatient::into_patient).collect())
  }

  async fn fetch_children(&self, patient_id: PatientId) -> Result<Vec<Visit>, GatewayError> {
    let params = query::visit_query(patient_id);
    let rows: Vec<ApiVisit> = self.get_rows(VISIT_TABLE, &params).await?;
    Ok(rows.into_iter().map(ApiVisit::into_visit).collect())
  }
}
