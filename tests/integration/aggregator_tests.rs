//! Integration tests for the aggregator
//!
//! These tests use wiremock to serve feed documents and run the scheduler
//! end-to-end against a SQLite database on disk.

use gator::aggregator::{HttpFetcher, Scheduler};
use gator::config::AggregatorConfig;
use gator::storage::{
    open_storage, FeedStore, FollowStore, PostStore, SqliteStorage, UserStore,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds an RSS document with one item per `(link, pubDate)` pair
fn rss_body(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(link, date)| {
            format!(
                "<item><title>Post {link}</title><link>{link}</link>\
                 <pubDate>{date}</pubDate><description>About {link}</description></item>"
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test</title><link>https://example.com/</link>
<description>Test feed</description>{items}</channel></rss>"#
    )
}

async fn mount_feed(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "application/rss+xml"),
        )
        .mount(server)
        .await;
}

fn open_db(dir: &TempDir) -> SqliteStorage {
    open_storage(&dir.path().join("gator.db")).unwrap()
}

fn fetcher() -> Arc<HttpFetcher> {
    Arc::new(HttpFetcher::from_config(&AggregatorConfig::default()).unwrap())
}

async fn run_for(storage: &Arc<Mutex<SqliteStorage>>, period: Duration, duration: Duration) {
    Scheduler::new(storage.clone(), fetcher(), period)
        .unwrap()
        .with_fetch_timeout(Duration::from_secs(5))
        .run(tokio::time::sleep(duration))
        .await;
}

#[tokio::test]
async fn test_aggregator_collects_posts() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/blog.xml",
        rss_body(&[
            ("https://blog.example/1", "Mon, 01 Jan 2024 00:00:00 +0000"),
            ("https://blog.example/2", "Tue, 02 Jan 2024 00:00:00 +0000"),
        ]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut db = open_db(&dir);
    let user = db.create_user("alice").unwrap();
    let feed_url = format!("{}/blog.xml", server.uri());
    let feed = db.create_feed("Blog", &feed_url, user.id).unwrap();
    db.create_feed_follow(user.id, feed.id).unwrap();

    let storage = Arc::new(Mutex::new(db));
    run_for(&storage, Duration::from_secs(3600), Duration::from_millis(200)).await;

    let store = storage.lock().unwrap();
    assert_eq!(store.count_posts_for_feed(feed.id).unwrap(), 2);

    let posts = store.posts_for_user(user.id, 10).unwrap();
    assert_eq!(posts[0].url, "https://blog.example/2");
    assert_eq!(posts[1].url, "https://blog.example/1");
    assert_eq!(posts[0].description.as_deref(), Some("About https://blog.example/2"));

    let refreshed = store.get_feed_by_url(&feed_url).unwrap().unwrap();
    assert!(refreshed.last_fetched_at.is_some());
}

#[tokio::test]
async fn test_repeated_runs_do_not_duplicate_posts() {
    let server = MockServer::start().await;
    mount_feed(
        &server,
        "/blog.xml",
        rss_body(&[("https://blog.example/1", "Mon, 01 Jan 2024 00:00:00 +0000")]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut db = open_db(&dir);
    let user = db.create_user("alice").unwrap();
    let feed = db
        .create_feed("Blog", &format!("{}/blog.xml", server.uri()), user.id)
        .unwrap();

    let storage = Arc::new(Mutex::new(db));
    run_for(&storage, Duration::from_millis(30), Duration::from_millis(150)).await;
    run_for(&storage, Duration::from_millis(30), Duration::from_millis(100)).await;

    let requests = server.received_requests().await.unwrap();
    assert!(requests.len() >= 2);
    assert_eq!(storage.lock().unwrap().count_posts_for_feed(feed.id).unwrap(), 1);
}

#[tokio::test]
async fn test_failing_feed_does_not_block_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_feed(
        &server,
        "/good.xml",
        rss_body(&[("https://good.example/1", "Mon, 01 Jan 2024 00:00:00 +0000")]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut db = open_db(&dir);
    let user = db.create_user("alice").unwrap();
    let broken = db
        .create_feed("Broken", &format!("{}/broken.xml", server.uri()), user.id)
        .unwrap();
    let good = db
        .create_feed("Good", &format!("{}/good.xml", server.uri()), user.id)
        .unwrap();

    let storage = Arc::new(Mutex::new(db));
    run_for(&storage, Duration::from_millis(50), Duration::from_millis(200)).await;

    let store = storage.lock().unwrap();
    assert_eq!(store.count_posts_for_feed(broken.id).unwrap(), 0);
    assert_eq!(store.count_posts_for_feed(good.id).unwrap(), 1);
}

#[tokio::test]
async fn test_no_feeds_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(Mutex::new(open_db(&dir)));

    run_for(&storage, Duration::from_millis(20), Duration::from_millis(60)).await;

    assert!(storage.lock().unwrap().list_feeds().unwrap().is_empty());
}
