use async_trait::async_trait;

use super::error::GatewayError;
use super::query::ParentFilter;
use super::types::{Patient, PatientId, Visit};

/// Read-only access to the remote patient and visit collections.
///
/// Implementations hold no state between calls and never touch the caches;
/// caching is the caller's business.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
  /// One page of patients matching `filter`, newest first.
  ///
  /// Returns at most `PAGE_SIZE` rows. Callers treat a full page as "more may
  /// follow"; this is a heuristic, not a count.
  async fn fetch_parents(
    &self,
    filter: &ParentFilter,
    page: usize,
  ) -> Result<Vec<Patient>, GatewayError>;

  /// Every visit of a patient, newest first.
  async fn fetch_children(&self, patient_id: PatientId) -> Result<Vec<Visit>, GatewayError>;
}
