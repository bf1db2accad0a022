// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET  /health
// - POST /api/analyze/article (validation, URL dedup)
// - GET  /api/articles, /api/articles/{id}
// - POST /api/ingest/batch + GET /api/ingest/status/{job_id}
// - GET  /api/live/status, POST /api/live/trigger

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use news_intel::api::{router, AppState};
use news_intel::ingest::coordinator::{BatchCoordinator, Ingestor};
use news_intel::ingest::jobs::JobRegistry;
use news_intel::ingest::providers::{NewsApiAdapter, RssAdapter};
use news_intel::ingest::types::SourceAdapter;
use news_intel::live::{LiveMonitor, SubscriberRegistry};
use news_intel::store::{ArticleStore, MemoryArticleStore};
use news_intel::NewsAnalyzer;

const BODY_LIMIT: usize = 1024 * 1024;
const RSS_XML: &str = include_str!("fixtures/rss_sample.xml");
const NEWSAPI_JSON: &str = include_str!("fixtures/newsapi_everything.json");

const FED_CONTENT: &str = "The Federal Reserve announced on Wednesday that it raised interest rates by 25 basis \
points, bringing the federal funds rate to 5.25%-5.50%. The decision was unanimous.";

/// Build the same Router the binary uses, over fixture adapters.
fn test_app() -> Router {
    let analyzer = Arc::new(NewsAnalyzer::default());
    let store: Arc<dyn ArticleStore> = Arc::new(MemoryArticleStore::new());
    let ingestor = Ingestor::new(analyzer.clone(), store.clone());

    let newsapi: Arc<dyn SourceAdapter> = Arc::new(NewsApiAdapter::from_fixture(NEWSAPI_JSON));
    let rss: Arc<dyn SourceAdapter> = Arc::new(RssAdapter::from_fixture(RSS_XML));
    let coordinator = Arc::new(BatchCoordinator::new(
        ingestor.clone(),
        vec![newsapi.clone(), rss],
        Arc::new(JobRegistry::default()),
    ));
    let monitor = Arc::new(LiveMonitor::new(
        ingestor,
        vec![newsapi],
        Arc::new(SubscriberRegistry::new()),
        5,
    ));
    router(AppState {
        analyzer,
        store,
        coordinator,
        monitor,
    })
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, v)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

fn post(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

#[tokio::test]
async fn health_is_ok() {
    let app = test_app();
    let (status, v) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "healthy");
}

#[tokio::test]
async fn analyze_article_returns_intelligence_and_stores_it() {
    let app = test_app();
    let payload = json!({
        "headline": "Federal Reserve raises interest rates by 0.25%",
        "content": FED_CONTENT,
        "source": "Reuters",
        "url": "https://news.test/fed",
        "published_at": "2023-07-26T18:00:00Z"
    });

    let (status, v) = send(&app, post("/api/analyze/article", payload.clone())).await;
    assert_eq!(status, StatusCode::OK, "{v}");
    assert_eq!(v["news_type"], "Policy");
    assert_eq!(v["source"], "Reuters");
    assert!(v["impact"]["confidence"].as_f64().is_some());
    assert!(v["facts"].as_array().is_some_and(|f| !f.is_empty()));

    // same URL again: served from the store, not duplicated
    let (status, again) = send(&app, post("/api/analyze/article", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again, v);

    let (status, list) = send(&app, get("/api/articles")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);
    assert_eq!(list["page"], 1);
    assert_eq!(list["page_size"], 20);
    let id = list["articles"][0]["id"].as_u64().expect("id");

    let (status, one) = send(&app, get(&format!("/api/articles/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(one["intelligence"]["headline"], v["headline"]);
    assert_eq!(one["processing_status"], "processed");
}

#[tokio::test]
async fn short_input_is_a_client_error() {
    let app = test_app();
    let (status, v) = send(
        &app,
        post(
            "/api/analyze/article",
            json!({"headline": "Too short", "content": FED_CONTENT, "source": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["detail"].as_str().is_some_and(|d| d.contains("headline")));
}

#[tokio::test]
async fn article_listing_validates_filters_and_missing_ids() {
    let app = test_app();
    let (status, v) = send(&app, get("/api/articles?scope=Planetary")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(v["detail"].is_string());

    let (status, v) = send(&app, get("/api/articles?scope=company&page_size=500")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["total"], 0);
    assert_eq!(v["page_size"], 100);

    let (status, v) = send(&app, get("/api/articles/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(v["detail"].is_string());
}

#[tokio::test]
async fn batch_ingestion_runs_in_background() {
    let app = test_app();
    let (status, v) = send(
        &app,
        post("/api/ingest/batch", json!({"source_type": "rss", "max_articles": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "started");
    let job_id = v["job_id"].as_str().expect("job id").to_string();

    let mut job = Json::Null;
    for _ in 0..100 {
        let (status, j) = send(&app, get(&format!("/api/ingest/status/{job_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        job = j;
        if job["status"] == "completed" || job["status"] == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(job["status"], "completed", "{job}");
    assert_eq!(job["source_type"], "rss");
    assert_eq!(job["total_articles"], 3);

    let (status, _) = send(&app, get("/api/ingest/status/no-such-job")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn live_status_and_manual_trigger() {
    let app = test_app();
    let (status, v) = send(&app, get("/api/live/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "stopped");
    assert_eq!(v["interval_minutes"], 5);
    assert_eq!(v["active_subscribers"], 0);

    let (status, v) = send(&app, post("/api/live/trigger", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "triggered");
    assert_eq!(v["new_articles"], 2);

    let (_, v) = send(&app, get("/api/live/status")).await;
    assert_eq!(v["total_processed"], 2);
    assert!(v["last_fetch"].is_string());
}
