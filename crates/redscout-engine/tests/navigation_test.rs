mod common;

use common::{Call, FakeBackend, note_url};
use redscout_engine::config::RedscoutConfig;
use redscout_engine::navigation::NavigationController;
use redscout_engine::{Pacer, ServiceError};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_same_note_with_different_query_is_on_target() {
    let config = RedscoutConfig::default();
    let pacer = Pacer::default();
    let navigator = NavigationController::new(&config.site, &config.timing, &pacer);
    let mut backend = FakeBackend::at(&note_url("abc123"));

    let target = format!("{}?xsec_token=t&xsec_source=pc_feed", note_url("abc123"));
    assert!(navigator.is_on_target(&mut backend, &target).await);
    assert!(!navigator.is_on_target(&mut backend, &note_url("other")).await);
}

#[tokio::test(start_paused = true)]
async fn test_revisit_only_settles() {
    let config = RedscoutConfig::default();
    let pacer = Pacer::default();
    let navigator = NavigationController::new(&config.site, &config.timing, &pacer);
    let mut backend = FakeBackend::at(&format!("{}?xsec_token=t", note_url("abc123")));

    let start = Instant::now();
    navigator
        .navigate_if_needed(&mut backend, &note_url("abc123"))
        .await
        .unwrap();

    assert!(backend.navigations().is_empty());
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert!(backend.calls().contains(&Call::ReleaseElements));
}

#[tokio::test(start_paused = true)]
async fn test_new_target_navigates_and_settles() {
    let config = RedscoutConfig::default();
    let pacer = Pacer::default();
    let navigator = NavigationController::new(&config.site, &config.timing, &pacer);
    let mut backend = FakeBackend::at(&note_url("abc123"));

    let start = Instant::now();
    navigator
        .navigate_if_needed(&mut backend, &note_url("def456"))
        .await
        .unwrap();

    assert_eq!(backend.navigations(), vec![note_url("def456")]);
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_location_navigates() {
    let config = RedscoutConfig::default();
    let pacer = Pacer::default();
    let navigator = NavigationController::new(&config.site, &config.timing, &pacer);
    let mut backend = FakeBackend::at(&note_url("abc123"));
    backend.page().url_unreadable = true;

    navigator
        .navigate_if_needed(&mut backend, &note_url("abc123"))
        .await
        .unwrap();

    assert_eq!(backend.navigations(), vec![note_url("abc123")]);
}

#[tokio::test(start_paused = true)]
async fn test_navigation_failure_is_reported() {
    let config = RedscoutConfig::default();
    let pacer = Pacer::default();
    let navigator = NavigationController::new(&config.site, &config.timing, &pacer);
    let mut backend = FakeBackend::new();
    backend.page().fail_navigation = true;

    let err = navigator
        .navigate_if_needed(&mut backend, &note_url("abc123"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Navigation(_)));
    assert!(err.is_retryable());
}

#[test]
fn test_feed_url_marks_source() {
    let config = RedscoutConfig::default();
    let pacer = Pacer::default();
    let navigator = NavigationController::new(&config.site, &config.timing, &pacer);

    let url = navigator.feed_url(&note_url("abc123"));
    assert_eq!(url, format!("{}?xsec_source=pc_feed", note_url("abc123")));
}
