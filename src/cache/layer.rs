//! Per-patient visit cache sitting between the companion and the gateway.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

use crate::remote::{GatewayError, PatientId, RemoteGateway, Visit};

use super::traits::CacheResult;

struct CacheEntry {
  visits: Vec<Visit>,
  cached_at: DateTime<Utc>,
  /// Sequence of the fetch that produced this entry
  seq: u64,
}

/// Handle for a visit fetch the caller has to perform and then `store`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
  pub patient_id: PatientId,
  seq: u64,
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
  /// Served from cache, no network needed
  Hit(CacheResult<Vec<Visit>>),
  /// Caller must fetch and store the result
  Miss(FetchTicket),
}

/// Session-lifetime cache mapping a patient to their visits, newest first.
///
/// Entries are overwritten by every successful fetch and never evicted; the
/// roster of a single clinic keeps this small.
#[derive(Default)]
pub struct ChildCache {
  entries: HashMap<PatientId, CacheEntry>,
  next_seq: u64,
}

impl ChildCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Look up visits for a patient.
  ///
  /// With `bypass` set, or when nothing is cached, returns a ticket for a
  /// network fetch instead.
  pub fn lookup(&mut self, patient_id: PatientId, bypass: bool) -> CacheLookup {
    if !bypass {
      if let Some(entry) = self.entries.get(&patient_id) {
        debug!(patient_id, "visit cache hit");
        return CacheLookup::Hit(CacheResult::from_cache(
          entry.visits.clone(),
          entry.cached_at,
        ));
      }
    }

    self.next_seq += 1;
    CacheLookup::Miss(FetchTicket {
      patient_id,
      seq: self.next_seq,
    })
  }

  /// Store the result of a ticketed fetch, overwriting any previous entry.
  ///
  /// Returns false when a newer fetch for the same patient was already
  /// stored; the entry is left as is.
  pub fn store(&mut self, ticket: FetchTicket, visits: Vec<Visit>) -> bool {
    if let Some(existing) = self.entries.get(&ticket.patient_id) {
      if existing.seq > ticket.seq {
        debug!(patient_id = ticket.patient_id, "ignoring out-of-order visit fetch");
        return false;
      }
    }

    self.entries.insert(
      ticket.patient_id,
      CacheEntry {
        visits,
        cached_at: Utc::now(),
        seq: ticket.seq,
      },
    );
    true
  }

  /// Cached visits for a patient, without touching the network.
  pub fn peek(&self, patient_id: PatientId) -> Option<&[Visit]> {
    self.entries.get(&patient_id).map(|e| e.visits.as_slice())
  }

  /// Cache-first read of a patient's visits.
  ///
  /// 1. Unless `bypass`, return the cached list with no network call
  /// 2. Otherwise fetch, overwrite the entry and return the fresh list
  pub async fn get(
    &mut self,
    gateway: &dyn RemoteGateway,
    patient_id: PatientId,
    bypass: bool,
  ) -> Result<CacheResult<Vec<Visit>>, GatewayError> {
    match self.lookup(patient_id, bypass) {
      CacheLookup::Hit(result) => Ok(result),
      CacheLookup::Miss(ticket) => {
        let visits = gateway.fetch_children(patient_id).await?;
        self.store(ticket, visits.clone());
        let cached_at = self
          .entries
          .get(&patient_id)
          .map(|e| e.cached_at)
          .unwrap_or_else(Utc::now);
        Ok(CacheResult::from_network(visits, cached_at))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheSource;
  use crate::remote::memory::fixtures::{now, patient, visit};
  use crate::remote::InMemoryGateway;

  fn gateway() -> InMemoryGateway {
    InMemoryGateway::new(
      vec![patient(7, "Tazi", "Omar", 3)],
      vec![visit(1, 7, "2026-10-01"), visit(2, 7, "2026-10-10")],
      now(),
    )
  }

  #[tokio::test]
  async fn test_warm_cache_makes_no_gateway_call() {
    let gw = gateway();
    let mut cache = ChildCache::new();

    let first = cache.get(&gw, 7, false).await.unwrap();
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(gw.child_calls().len(), 1);

    let second = cache.get(&gw, 7, false).await.unwrap();
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(second.data, first.data);
    assert_eq!(gw.child_calls().len(), 1);
  }

  #[tokio::test]
  async fn test_bypass_always_fetches_and_overwrites() {
    let gw = gateway();
    let mut cache = ChildCache::new();
    let seeded = cache.lookup(7, false);
    let CacheLookup::Miss(ticket) = seeded else {
      panic!("expected a miss on a cold cache");
    };
    cache.store(ticket, vec![visit(99, 7, "2020-01-01")]);

    let fresh = cache.get(&gw, 7, true).await.unwrap();
    assert_eq!(fresh.source, CacheSource::Network);
    assert_eq!(gw.child_calls(), vec![7]);
    assert_eq!(
      cache.peek(7).unwrap().iter().map(|v| v.id).collect::<Vec<_>>(),
      vec![2, 1]
    );

    cache.get(&gw, 7, true).await.unwrap();
    assert_eq!(gw.child_calls(), vec![7, 7]);
  }

  #[tokio::test]
  async fn test_failed_fetch_keeps_previous_entry() {
    let gw = gateway();
    let mut cache = ChildCache::new();
    cache.get(&gw, 7, false).await.unwrap();

    gw.fail_next_children(GatewayError::Timeout);
    assert_eq!(cache.get(&gw, 7, true).await, Err(GatewayError::Timeout));
    assert_eq!(cache.peek(7).map(|v| v.len()), Some(2));
  }

  #[test]
  fn test_older_fetch_does_not_overwrite_newer() {
    let mut cache = ChildCache::new();
    let CacheLookup::Miss(older) = cache.lookup(7, true) else {
      panic!("bypass must miss");
    };
    let CacheLookup::Miss(newer) = cache.lookup(7, true) else {
      panic!("bypass must miss");
    };

    assert!(cache.store(newer, vec![visit(2, 7, "2026-10-10")]));
    assert!(!cache.store(older, vec![visit(1, 7, "2026-10-01")]));
    assert_eq!(cache.peek(7).unwrap()[0].id, 2);
  }
}
