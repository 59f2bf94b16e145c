//! Concurrent "query all sources" aggregation

mod utils;

use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_err;
use utils::{fast_config, manager_with, manager_with_config, FakeSource};

#[tokio::test]
async fn merges_unique_titles_and_omits_failures() {
    let a = Arc::new(FakeSource::new("a").with_titles(&["Naruto", "Bleach"]));
    let b = Arc::new(FakeSource::new("b").failing());
    let c = Arc::new(FakeSource::new("c").with_titles(&["One Piece", "NARUTO", "Monster"]));
    let manager = manager_with(&[a.clone(), b.clone(), c.clone()]);

    let merged = manager.search_all("anything", 1).await.unwrap();

    let titles: Vec<_> = merged.results.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Naruto", "Bleach", "One Piece", "Monster"]);
    assert_eq!(merged.results[0].source, "a");
    assert_eq!(merged.sources, vec!["a", "c"]);
    assert_eq!(merged.failed_sources, vec!["b"]);
    assert_eq!((a.searches(), b.searches(), c.searches()), (1, 1, 1));
}

#[tokio::test(start_paused = true)]
async fn slow_sources_miss_the_deadline() {
    let fast = Arc::new(FakeSource::new("fast").with_titles(&["Quick Show"]));
    let slow = Arc::new(
        FakeSource::new("slow")
            .with_titles(&["Late Show"])
            .with_delay(Duration::from_secs(30)),
    );

    let mut config = fast_config();
    config.manager.call_timeout = Duration::from_secs(60);
    config.manager.fanout_deadline = Duration::from_secs(1);
    let manager = manager_with_config(&[fast, slow], config);

    let merged = manager.search_all("anything", 1).await.unwrap();

    assert_eq!(merged.results.len(), 1);
    assert_eq!(merged.results[0].title, "Quick Show");
    assert_eq!(merged.failed_sources, vec!["slow"]);
}

#[tokio::test]
async fn offline_sources_sit_out_the_fan_out() {
    let up = Arc::new(FakeSource::new("up").with_titles(&["Show"]));
    let down = Arc::new(FakeSource::new("down").with_titles(&["Other"]).unhealthy());
    let manager = manager_with(&[up, down.clone()]);

    manager.check_all_health().await;
    let merged = manager.search_all("anything", 1).await.unwrap();

    assert_eq!(merged.sources, vec!["up"]);
    assert!(merged.failed_sources.is_empty());
    assert_eq!(down.searches(), 0);
}

#[tokio::test]
async fn everything_offline_still_asks_everyone() {
    let a = Arc::new(FakeSource::new("a").with_titles(&["Show A"]).unhealthy());
    let b = Arc::new(FakeSource::new("b").with_titles(&["Show B"]).unhealthy());
    let manager = manager_with(&[a.clone(), b.clone()]);

    manager.check_all_health().await;
    let merged = manager.search_all("anything", 1).await.unwrap();

    assert_eq!(merged.results.len(), 2);
    assert_eq!((a.searches(), b.searches()), (1, 1));
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let a = Arc::new(FakeSource::new("a").with_titles(&["Show"]));
    let manager = manager_with(&[a.clone()]);

    assert_err!(manager.search_all(" ", 1).await);
    assert_eq!(a.searches(), 0);
}
