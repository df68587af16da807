//! Leaderboard fetch, ranking, and the one-time "this run" disclosure.

mod support;

use serde_json::json;

use memory_match::adapter::leaderboard::THIS_RUN_MARKER;
use memory_match::adapter::{
    ApiResponse, BoardStatus, FetchOutcome, LeaderboardError, PendingRun, TransportError,
};
use memory_match::types::DisplayRank;
use support::{init_logging, leaderboard_body, not_found, services_with, ScriptedTransport};

#[tokio::test]
async fn test_estimated_rank_for_unlisted_run() {
    init_logging();
    let transport = ScriptedTransport::new([leaderboard_body(&[
        ("a", 30),
        ("b", 40),
        ("c", 60),
        ("d", 70),
    ])]);
    let (services, _store) = services_with(transport, Some("me"));
    services.records.record_completion("me", 50).unwrap();

    let reconciliation = services.reconciler.reconcile_stored().await;
    assert_eq!(reconciliation.rank, Some(DisplayRank::Estimated(3)));
    assert!(reconciliation.consumed);

    let view = &reconciliation.view;
    assert_eq!(view.status, BoardStatus::Loaded);
    let banner = view.banner.as_ref().unwrap();
    assert_eq!(
        banner.to_string(),
        "This run: me  00:00:50   (Estimated rank #3)   Best: 00:00:50"
    );

    let local: Vec<_> = view.rows.iter().filter(|r| r.this_run).collect();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].position, 3);
    assert_eq!(local[0].recorded_at, THIS_RUN_MARKER);
    assert_eq!(view.rows.len(), 5);
}

#[tokio::test]
async fn test_confirmed_rank_adds_no_local_row() {
    let transport = ScriptedTransport::new([leaderboard_body(&[("a", 30), ("me", 50), ("d", 70)])]);
    let (services, _store) = services_with(transport, Some("me"));
    services.records.record_completion("me", 50).unwrap();

    let reconciliation = services.reconciler.reconcile_stored().await;
    assert_eq!(reconciliation.rank, Some(DisplayRank::Confirmed(2)));
    assert_eq!(reconciliation.view.rows.len(), 3);
    assert!(reconciliation.view.rows.iter().all(|r| !r.this_run));
}

#[tokio::test]
async fn test_pending_run_disclosed_once() {
    let transport = ScriptedTransport::new([
        leaderboard_body(&[("a", 30)]),
        leaderboard_body(&[("a", 30)]),
    ]);
    let (services, _store) = services_with(transport, Some("me"));
    services.records.record_completion("me", 50).unwrap();

    let first = services.reconciler.reconcile_stored().await;
    assert!(first.view.banner.is_some());

    let second = services.reconciler.reconcile_stored().await;
    assert!(second.view.banner.is_none());
    assert_eq!(second.view.best_seconds, Some(50));
    assert!(second.view.to_string().starts_with("Best: 00:00:50\n"));
    assert_eq!(second.rank, None);
    assert!(!second.consumed);
    assert!(second.view.rows.iter().all(|r| !r.this_run));
}

#[tokio::test]
async fn test_concurrent_views_consume_once() {
    let (services, _store) = services_with(ScriptedTransport::new([]), Some("me"));
    let run = services.records.record_completion("me", 50).unwrap();

    let fetched = FetchOutcome::Entries(Vec::new());
    let a = services.reconciler.settle(Some(run.clone()), 50, fetched.clone());
    let b = services.reconciler.settle(Some(run), 50, fetched);

    assert_eq!(
        [a.consumed, b.consumed].iter().filter(|c| **c).count(),
        1
    );
    assert_eq!(
        [&a, &b].iter().filter(|r| r.view.banner.is_some()).count(),
        1
    );
}

#[tokio::test]
async fn test_transient_failure_keeps_run_pending() {
    let transport = ScriptedTransport::new([
        ApiResponse::Exception(TransportError::Timeout),
        ApiResponse::Error {
            code: 503,
            message: "Service Unavailable".to_string(),
        },
        leaderboard_body(&[("a", 30)]),
    ]);
    let (services, _store) = services_with(transport, Some("me"));
    services.records.record_completion("me", 50).unwrap();

    let timeout = services.reconciler.reconcile_stored().await;
    assert!(!timeout.consumed);
    assert_eq!(
        timeout.view.status.message().as_deref(),
        Some("Network error: request timed out")
    );
    assert!(timeout.view.banner.as_ref().is_some_and(|b| b.rank.is_none()));

    let unavailable = services.reconciler.reconcile_stored().await;
    assert!(!unavailable.consumed);
    assert!(services.records.pending().is_some_and(|r| r.is_pending()));

    let recovered = services.reconciler.reconcile_stored().await;
    assert!(recovered.consumed);
    assert_eq!(recovered.rank, Some(DisplayRank::Estimated(2)));
}

#[tokio::test]
async fn test_final_http_error_consumes_run() {
    let transport = ScriptedTransport::new([ApiResponse::Error {
        code: 403,
        message: "Forbidden".to_string(),
    }]);
    let (services, _store) = services_with(transport, Some("me"));
    services.records.record_completion("me", 50).unwrap();

    let reconciliation = services.reconciler.reconcile_stored().await;
    assert!(reconciliation.consumed);
    assert_eq!(
        reconciliation.view.status.message().as_deref(),
        Some("Load failed (HTTP 403): Forbidden")
    );
    assert!(services.records.pending().is_some_and(|r| r.consumed));
}

#[tokio::test]
async fn test_endpoint_fallback_on_404_only() {
    let transport = ScriptedTransport::new([
        not_found(),
        not_found(),
        leaderboard_body(&[("a", 30)]),
    ]);
    let (services, _store) = services_with(transport.clone(), Some("me"));

    let outcome = services.reconciler.fetch().await;
    assert!(matches!(outcome, FetchOutcome::Entries(ref e) if e.len() == 1));

    let endpoints: Vec<_> = transport.calls().into_iter().map(|c| c.endpoint).collect();
    assert_eq!(
        endpoints,
        vec![
            "Score/leaderboard?page=1&size=50",
            "score/leaderboard?page=1&size=50",
            "Score/leaderboard?pageNumber=1&pageSize=50",
        ]
    );
}

#[tokio::test]
async fn test_every_endpoint_missing() {
    let transport = ScriptedTransport::new(std::iter::repeat_with(not_found).take(20));
    let (services, _store) = services_with(transport.clone(), Some("me"));

    let outcome = services.reconciler.fetch().await;
    assert_eq!(outcome, FetchOutcome::Failed(LeaderboardError::EndpointNotFound));
    assert_eq!(transport.calls().len(), support::test_config().leaderboard_endpoints.len());

    let view = services.reconciler.settle(None, 50, outcome).view;
    assert_eq!(
        view.status.message().as_deref(),
        Some("Load failed (HTTP 404): leaderboard endpoint not found.")
    );
}

#[tokio::test]
async fn test_signed_out_view() {
    let transport = ScriptedTransport::new([]);
    let (services, _store) = services_with(transport.clone(), None);
    services.records.record_completion("You", 50).unwrap();

    let reconciliation = services.reconciler.reconcile_stored().await;
    assert_eq!(reconciliation.view.status, BoardStatus::NotSignedIn);
    assert!(transport.calls().is_empty());
    assert!(reconciliation.consumed);

    let rows = &reconciliation.view.rows;
    assert_eq!(rows.len(), 1);
    assert!(rows[0].this_run);
}

#[tokio::test]
async fn test_unusable_body_reads_as_empty() {
    let transport = ScriptedTransport::new([
        ApiResponse::Success(json!({ "code": 500, "message": "db down" })),
        ApiResponse::Success(json!({ "code": 200, "data": { "items": [] } })),
    ]);
    let (services, _store) = services_with(transport, Some("me"));

    assert_eq!(services.reconciler.fetch().await, FetchOutcome::Entries(Vec::new()));
    let view = services.reconciler.reconcile(None, 50).await.view;
    assert_eq!(view.status, BoardStatus::Empty);
    assert_eq!(view.status.message().as_deref(), Some("No scores yet."));
}

#[tokio::test]
async fn test_rows_deduped_and_limited() {
    let transport = ScriptedTransport::new([leaderboard_body(&[
        ("c", 60),
        ("a", 30),
        ("a", 30),
        ("b", 40),
    ])]);
    let (services, _store) = services_with(transport, Some("me"));

    let shown_already = PendingRun {
        username: "me".into(),
        seconds: 10,
        consumed: true,
    };
    let view = services
        .reconciler
        .reconcile(Some(shown_already), 50)
        .await
        .view;
    let rows: Vec<_> = view.rows.iter().map(|r| (r.username.as_str(), r.seconds)).collect();
    assert_eq!(rows, vec![("a", 30), ("b", 40), ("c", 60)]);
    assert!(view.banner.is_none());
}

#[tokio::test]
async fn test_top_n_limits_ranking_window() {
    let transport = ScriptedTransport::new([leaderboard_body(&[
        ("a", 30),
        ("b", 40),
        ("c", 60),
        ("me", 80),
    ])]);
    let (services, _store) = services_with(transport, Some("me"));
    let run = services.records.record_completion("me", 80).unwrap();

    let reconciliation = services.reconciler.reconcile(Some(run), 3).await;
    assert_eq!(reconciliation.entries.len(), 3);
    assert_eq!(reconciliation.rank, Some(DisplayRank::Estimated(4)));
    assert!(reconciliation.view.rows.iter().any(|r| r.this_run));
}
