//! Streaming resolution through the manager

mod utils;

use anisource_lib::modules::anime::domain::value_objects::VideoQuality;
use anisource_lib::{HealthStatus, SourceProfile, StreamCategory};
use std::sync::Arc;
use tokio_test::assert_err;
use utils::{manager_with, FakeSource};

fn streaming_source(name: &str, servers: &[&str]) -> FakeSource {
    FakeSource::new(name).with_profile(
        SourceProfile::new(name).streaming(VideoQuality::P1080, servers.iter().copied()),
    )
}

#[tokio::test(start_paused = true)]
async fn falls_back_across_servers_with_retries() {
    let source = Arc::new(streaming_source("stream", &["alpha", "beta"]).playable_on(
        "beta",
        &[VideoQuality::P360, VideoQuality::P1080, VideoQuality::Auto, VideoQuality::P720],
    ));
    let manager = manager_with(&[source.clone()]);

    let bundle = manager
        .get_streaming_links("ep-1", None, StreamCategory::Sub, None)
        .await
        .unwrap();

    assert_eq!(bundle.source, "stream");
    assert_eq!(bundle.server.as_deref(), Some("beta"));
    let qualities: Vec<_> = bundle.sources.iter().map(|v| v.quality).collect();
    assert_eq!(
        qualities,
        vec![
            VideoQuality::P1080,
            VideoQuality::P720,
            VideoQuality::P360,
            VideoQuality::Auto
        ]
    );

    // Two attempts on alpha, then beta succeeds on the first try
    let tried = source.servers_tried.lock().unwrap().clone();
    assert_eq!(
        tried,
        vec![
            Some("alpha".to_string()),
            Some("alpha".to_string()),
            Some("beta".to_string())
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn requested_server_is_tried_first() {
    let source = Arc::new(
        streaming_source("stream", &["alpha", "beta"]).playable_on("beta", &[VideoQuality::P720]),
    );
    let manager = manager_with(&[source.clone()]);

    let bundle = manager
        .get_streaming_links("ep-1", Some("BETA"), StreamCategory::Sub, None)
        .await
        .unwrap();

    assert!(bundle.is_playable());
    assert_eq!(bundle.server.as_deref(), Some("BETA"));
    assert_eq!(source.streams(), 1);
}

#[tokio::test(start_paused = true)]
async fn metadata_only_sources_are_skipped_when_undirected() {
    let metadata = Arc::new(FakeSource::new("metadata").with_titles(&["Show"]));
    let source = Arc::new(
        streaming_source("stream", &["main"]).playable_on("main", &[VideoQuality::P480]),
    );
    let manager = manager_with(&[metadata.clone(), source]);

    let bundle = manager
        .get_streaming_links("ep-9", None, StreamCategory::Sub, None)
        .await
        .unwrap();

    assert_eq!(bundle.source, "stream");
    assert_eq!(metadata.streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn exhaustion_returns_an_empty_bundle() {
    let broken = Arc::new(streaming_source("broken", &["alpha", "beta"]).failing());
    let manager = manager_with(&[broken.clone()]);

    let bundle = manager
        .get_streaming_links("ep-1", None, StreamCategory::Dub, None)
        .await
        .unwrap();

    assert!(!bundle.is_playable());
    assert_eq!(bundle.source, "none");
    assert_eq!(broken.streams(), 4);
}

#[tokio::test(start_paused = true)]
async fn one_unplayable_episode_does_not_take_the_source_offline() {
    let broken = Arc::new(streaming_source("broken", &["a", "b", "c"]).failing());
    let manager = manager_with(&[broken.clone()]);

    let bundle = manager
        .get_streaming_links("ep-1", None, StreamCategory::Sub, None)
        .await
        .unwrap();
    assert!(!bundle.is_playable());
    assert_eq!(broken.streams(), 6);

    let health = manager.get_health_status().await;
    assert_eq!(health[0].consecutive_failures, 1);
    assert_ne!(health[0].status, HealthStatus::Offline);

    // The source is still offered for the next episode
    manager
        .get_streaming_links("ep-2", None, StreamCategory::Sub, None)
        .await
        .unwrap();
    assert_eq!(broken.streams(), 12);
}

#[tokio::test]
async fn unknown_source_is_rejected() {
    let source = Arc::new(streaming_source("stream", &["main"]));
    let manager = manager_with(&[source]);

    assert_err!(
        manager
            .get_streaming_links("ep-1", None, StreamCategory::Sub, Some("nope"))
            .await
    );
}
