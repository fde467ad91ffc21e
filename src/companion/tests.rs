use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use super::*;
use crate::cache::CacheSource;
use crate::remote::memory::fixtures::{now, patient, roster, visit};
use crate::remote::{ErrorKind, InMemoryGateway};

const DEBOUNCE: Duration = Duration::from_millis(300);

fn companion(gw: &Arc<InMemoryGateway>) -> (Companion, UnboundedReceiver<DataEvent>) {
  Companion::new(gw.clone() as Arc<dyn RemoteGateway>, DEBOUNCE)
}

/// Apply completions until nothing arrives for a (virtual) second.
async fn settle(companion: &mut Companion, rx: &mut UnboundedReceiver<DataEvent>) {
  while let Ok(Some(event)) = timeout(Duration::from_secs(1), rx.recv()).await {
    companion.handle(event);
  }
}

fn ids(patients: &[Patient]) -> Vec<PatientId> {
  patients.iter().map(|p| p.id).collect()
}

#[tokio::test(start_paused = true)]
async fn test_reset_is_idempotent_under_stable_data() {
  let gw = Arc::new(InMemoryGateway::new(roster(30), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);

  companion.start();
  settle(&mut companion, &mut rx).await;
  let first = companion.view().patients().items().to_vec();

  companion.refresh();
  assert_eq!(companion.view().patients().activity(), Activity::Refreshing);
  settle(&mut companion, &mut rx).await;

  assert_eq!(companion.view().patients().items(), first.as_slice());
  assert_eq!(gw.parent_calls(), vec![(ParentFilter::default(), 0); 2]);
}

#[tokio::test(start_paused = true)]
async fn test_pages_through_45_records() {
  let gw = Arc::new(InMemoryGateway::new(roster(45), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);

  companion.start();
  settle(&mut companion, &mut rx).await;
  assert_eq!(companion.view().patients().items().len(), 20);
  assert!(companion.view().has_more());

  companion.load_more();
  settle(&mut companion, &mut rx).await;
  assert_eq!(companion.view().patients().items().len(), 40);
  assert!(companion.view().has_more());

  companion.load_more();
  settle(&mut companion, &mut rx).await;
  assert_eq!(
    ids(companion.view().patients().items()),
    (1..=45).collect::<Vec<_>>()
  );
  assert!(!companion.view().has_more());

  companion.load_more();
  settle(&mut companion, &mut rx).await;
  let pages: Vec<usize> = gw.parent_calls().into_iter().map(|(_, p)| p).collect();
  assert_eq!(pages, vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_load_more_while_resetting_issues_nothing() {
  let gw = Arc::new(InMemoryGateway::new(roster(45), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);

  companion.start();
  settle(&mut companion, &mut rx).await;
  companion.refresh();
  companion.load_more();
  settle(&mut companion, &mut rx).await;

  assert_eq!(gw.parent_calls().len(), 2);
  assert_eq!(companion.view().patients().items().len(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_recent_toggle_filters_and_orders() {
  let gw = Arc::new(InMemoryGateway::new(
    vec![patient(1, "Amrani", "A", 40), patient(2, "Bennani", "B", 5)],
    vec![],
    now(),
  ));
  let (mut companion, mut rx) = companion(&gw);

  companion.start();
  settle(&mut companion, &mut rx).await;
  assert_eq!(ids(companion.view().patients().items()), vec![2, 1]);

  companion.toggle_recent();
  settle(&mut companion, &mut rx).await;
  assert!(companion.recent_only());
  assert_eq!(ids(companion.view().patients().items()), vec![2]);

  companion.toggle_recent();
  settle(&mut companion, &mut rx).await;
  assert_eq!(ids(companion.view().patients().items()), vec![2, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_typing_burst_issues_one_query() {
  let gw = Arc::new(InMemoryGateway::new(
    vec![patient(1, "Alioui", "Sara", 1), patient(2, "Bennani", "Omar", 2)],
    vec![],
    now(),
  ));
  let (mut companion, mut rx) = companion(&gw);
  companion.start();
  settle(&mut companion, &mut rx).await;

  companion.change_search_text("a");
  tokio::time::advance(Duration::from_millis(100)).await;
  companion.change_search_text("al");
  tokio::time::advance(Duration::from_millis(100)).await;
  companion.change_search_text("ali");
  settle(&mut companion, &mut rx).await;

  let calls = gw.parent_calls();
  assert_eq!(calls.len(), 2);
  assert_eq!(calls[1], (ParentFilter::new("ali", false), 0));
  assert_eq!(ids(companion.view().patients().items()), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_pauses_longer_than_debounce_query_each_time() {
  let gw = Arc::new(InMemoryGateway::new(roster(5), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);

  companion.change_search_text("pat");
  settle(&mut companion, &mut rx).await;
  companion.change_search_text("patient1");
  settle(&mut companion, &mut rx).await;
  companion.change_search_text("patient1");
  settle(&mut companion, &mut rx).await;

  let texts: Vec<String> = gw.parent_calls().into_iter().map(|(f, _)| f.text).collect();
  assert_eq!(texts, vec!["pat", "patient1"]);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_during_debounce_resets_once_with_latest_text() {
  let gw = Arc::new(InMemoryGateway::new(roster(5), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);

  companion.change_search_text("pat");
  companion.toggle_recent();
  settle(&mut companion, &mut rx).await;

  assert_eq!(gw.parent_calls(), vec![(ParentFilter::new("pat", true), 0)]);
}

#[tokio::test(start_paused = true)]
async fn test_slow_search_result_is_not_applied_after_newer_one() {
  let gw = Arc::new(InMemoryGateway::new(
    vec![patient(1, "Alioui", "Sara", 1), patient(2, "Bennani", "Omar", 2)],
    vec![],
    now(),
  ));
  let (mut companion, mut rx) = companion(&gw);

  gw.delay_next_parents(Duration::from_millis(800));
  companion.change_search_text("ali");
  // debounce elapses; the "ali" query goes out and stalls
  let event = rx.recv().await.unwrap();
  assert!(matches!(event, DataEvent::SearchDebounced(_)));
  companion.handle(event);
  companion.change_search_text("ben");
  settle(&mut companion, &mut rx).await;

  assert_eq!(gw.parent_calls().len(), 2);
  assert_eq!(ids(companion.view().patients().items()), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn test_later_selection_wins() {
  let gw = Arc::new(InMemoryGateway::new(
    vec![patient(1, "Amrani", "X", 1), patient(2, "Bennani", "Y", 2)],
    vec![visit(10, 1, "2026-10-01"), visit(20, 2, "2026-10-02")],
    now(),
  ));
  gw.delay_children(1, Duration::from_millis(500));
  gw.delay_children(2, Duration::from_millis(50));
  let (mut companion, mut rx) = companion(&gw);
  companion.start();
  settle(&mut companion, &mut rx).await;

  companion.select_patient(1);
  companion.select_patient(2);
  settle(&mut companion, &mut rx).await;

  assert_eq!(companion.view().selected_id(), Some(2));
  let shown: Vec<i64> = companion.view().visits().items().iter().map(|v| v.id).collect();
  assert_eq!(shown, vec![20]);
  // the late result for X still warms the cache
  assert_eq!(companion.cache.peek(1).map(|v| v[0].id), Some(10));
}

#[tokio::test(start_paused = true)]
async fn test_reselecting_uses_cache_and_refresh_bypasses_it() {
  let gw = Arc::new(InMemoryGateway::new(
    vec![patient(7, "Tazi", "Omar", 1)],
    vec![visit(1, 7, "2026-10-01")],
    now(),
  ));
  let (mut companion, mut rx) = companion(&gw);
  companion.start();
  settle(&mut companion, &mut rx).await;

  companion.select_patient(7);
  settle(&mut companion, &mut rx).await;
  assert_eq!(
    companion.view().visits_source().map(|(s, _)| s),
    Some(CacheSource::Network)
  );

  companion.clear_selection();
  assert_eq!(companion.view().selected_id(), None);
  companion.select_patient(7);
  assert_eq!(
    companion.view().visits_source().map(|(s, _)| s),
    Some(CacheSource::Cache)
  );
  assert_eq!(gw.child_calls(), vec![7]);

  companion.refresh();
  assert_eq!(companion.view().visits().activity(), Activity::Refreshing);
  settle(&mut companion, &mut rx).await;
  assert_eq!(gw.child_calls(), vec![7, 7]);
  assert_eq!(companion.view().visits().activity(), Activity::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_failed_visit_refresh_keeps_visits_and_retries() {
  let gw = Arc::new(InMemoryGateway::new(
    vec![patient(7, "Tazi", "Omar", 1)],
    vec![visit(1, 7, "2026-10-01"), visit(2, 7, "2026-10-05")],
    now(),
  ));
  let (mut companion, mut rx) = companion(&gw);
  companion.start();
  settle(&mut companion, &mut rx).await;
  companion.select_patient(7);
  settle(&mut companion, &mut rx).await;

  gw.fail_next_children(GatewayError::Timeout);
  companion.refresh();
  settle(&mut companion, &mut rx).await;

  let view = companion.view();
  assert_eq!(view.visits().items().len(), 2);
  let notice = view.visits().error().unwrap();
  assert_eq!(
    notice.retry,
    Some(RetryAction::LoadVisits {
      patient_id: 7,
      bypass: true
    })
  );

  companion.retry();
  settle(&mut companion, &mut rx).await;
  assert!(companion.view().visits().error().is_none());
  assert_eq!(gw.child_calls(), vec![7, 7, 7]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_reset_empties_list_and_retry_reissues_query() {
  let gw = Arc::new(InMemoryGateway::new(roster(3), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);
  companion.start();
  settle(&mut companion, &mut rx).await;
  assert_eq!(companion.view().patients().items().len(), 3);

  gw.fail_next_parents(GatewayError::Network("connection reset".into()));
  companion.toggle_recent();
  settle(&mut companion, &mut rx).await;

  let view = companion.view();
  assert!(view.patients().items().is_empty());
  assert!(!view.is_empty_result());
  let notice = view.patients().error().unwrap();
  assert_eq!(notice.kind, ErrorKind::Network);
  assert_eq!(
    notice.retry,
    Some(RetryAction::ResetPatients(ParentFilter::new("", true)))
  );

  companion.retry();
  settle(&mut companion, &mut rx).await;
  let calls = gw.parent_calls();
  assert_eq!(calls[1], calls[2]);
  assert_eq!(companion.view().patients().items().len(), 3);
  assert!(companion.view().patients().error().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_next_page_keeps_list() {
  let gw = Arc::new(InMemoryGateway::new(roster(45), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);
  companion.start();
  settle(&mut companion, &mut rx).await;

  gw.fail_next_parents(GatewayError::Server {
    status: 502,
    message: "bad gateway".into(),
  });
  companion.load_more();
  settle(&mut companion, &mut rx).await;

  let view = companion.view();
  assert_eq!(view.patients().items().len(), 20);
  assert!(view.has_more());
  assert!(view.patients().error().is_none());
  assert_eq!(
    view.next_page_error().and_then(|n| n.retry.clone()),
    Some(RetryAction::LoadNextPage)
  );

  companion.retry();
  settle(&mut companion, &mut rx).await;
  assert_eq!(companion.view().patients().items().len(), 40);
  assert!(companion.view().next_page_error().is_none());
  let pages: Vec<usize> = gw.parent_calls().into_iter().map(|(_, p)| p).collect();
  assert_eq!(pages, vec![0, 1, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_reset_supersedes_in_flight_next_page() {
  let gw = Arc::new(InMemoryGateway::new(roster(45), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);
  companion.start();
  settle(&mut companion, &mut rx).await;

  gw.delay_next_parents(Duration::from_millis(500));
  companion.load_more();
  companion.refresh();
  settle(&mut companion, &mut rx).await;

  let view = companion.view();
  assert_eq!(ids(view.patients().items()), (1..=20).collect::<Vec<_>>());
  assert!(view.has_more());
  assert_eq!(view.patients().activity(), Activity::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_auth_failure_has_no_retry() {
  let gw = Arc::new(InMemoryGateway::new(roster(3), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);

  gw.fail_next_parents(GatewayError::Unauthenticated);
  companion.start();
  settle(&mut companion, &mut rx).await;

  let notice = companion.view().patients().error().unwrap();
  assert_eq!(notice.kind, ErrorKind::Auth);
  assert_eq!(notice.retry, None);

  companion.retry();
  settle(&mut companion, &mut rx).await;
  assert_eq!(gw.parent_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_does_not_skip_past_an_auth_error() {
  let gw = Arc::new(InMemoryGateway::new(
    roster(45),
    vec![visit(1, 1, "2026-10-01")],
    now(),
  ));
  let (mut companion, mut rx) = companion(&gw);
  companion.start();
  settle(&mut companion, &mut rx).await;

  gw.fail_next_parents(GatewayError::Timeout);
  companion.load_more();
  settle(&mut companion, &mut rx).await;
  assert!(companion.view().next_page_error().is_some());

  gw.fail_next_children(GatewayError::Unauthenticated);
  companion.select_patient(1);
  settle(&mut companion, &mut rx).await;
  let notice = companion.view().visits().error().unwrap();
  assert_eq!(notice.kind, ErrorKind::Auth);

  companion.retry();
  settle(&mut companion, &mut rx).await;
  let pages: Vec<usize> = gw.parent_calls().into_iter().map(|(_, p)| p).collect();
  assert_eq!(pages, vec![0, 1]);
  assert_eq!(gw.child_calls(), vec![1]);
  assert_eq!(companion.view().patients().items().len(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_empty_result_is_not_an_error() {
  let gw = Arc::new(InMemoryGateway::new(roster(3), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);

  companion.change_search_text("nobody");
  settle(&mut companion, &mut rx).await;

  assert!(companion.view().is_empty_result());
  assert!(!companion.view().has_more());
  assert_eq!(companion.search_text(), "nobody");
}

#[tokio::test(start_paused = true)]
async fn test_new_search_hides_previous_empty_result() {
  let gw = Arc::new(InMemoryGateway::new(roster(3), vec![], now()));
  let (mut companion, mut rx) = companion(&gw);

  companion.change_search_text("nobody");
  settle(&mut companion, &mut rx).await;
  assert!(companion.view().is_empty_result());

  gw.delay_next_parents(Duration::from_millis(500));
  companion.change_search_text("patient");
  let debounced = rx.recv().await.unwrap();
  companion.handle(debounced);

  assert_eq!(companion.view().patients().activity(), Activity::Loading);
  assert!(!companion.view().is_empty_result());

  settle(&mut companion, &mut rx).await;
  assert_eq!(ids(companion.view().patients().items()), vec![1, 2, 3]);
  assert!(!companion.view().is_empty_result());
}
