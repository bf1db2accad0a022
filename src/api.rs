use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::analyze::text::fingerprint;
use crate::analyze::types::{IntelligenceRecord, NewsType, Scope};
use crate::analyze::NewsAnalyzer;
use crate::error::PipelineError;
use crate::ingest::coordinator::{BatchCoordinator, IngestRequest};
use crate::ingest::jobs::IngestionJob;
use crate::ingest::types::{RawArticle, SourceType};
use crate::live::{ChannelSink, LiveMonitor, LiveStatus};
use crate::store::{ArticleFilter, ArticleStore, ProcessingStatus, StoredArticle};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<NewsAnalyzer>,
    pub store: Arc<dyn ArticleStore>,
    pub coordinator: Arc<BatchCoordinator>,
    pub monitor: Arc<LiveMonitor>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy"})) }))
        .route("/api/analyze/article", post(analyze_article))
        .route("/api/ingest/batch", post(ingest_batch))
        .route("/api/ingest/status/{job_id}", get(ingest_status))
        .route("/api/articles", get(list_articles))
        .route("/api/articles/{id}", get(get_article))
        .route("/api/live/stream", get(live_stream))
        .route("/api/live/status", get(live_status))
        .route("/api/live/trigger", post(live_trigger))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `PipelineError` as an HTTP response with a `{"detail": ...}` body.
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PipelineError::JobNotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::DuplicateUrl(_) => StatusCode::CONFLICT,
            PipelineError::SourceUnavailable { .. } => StatusCode::BAD_GATEWAY,
            PipelineError::StorageFailure(_) | PipelineError::SubscriberUnreachable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "detail": self.0.to_string() }))).into_response()
    }
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "detail": format!("{what} not found") })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct AnalyzeArticleReq {
    headline: String,
    content: String,
    source: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

async fn analyze_article(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeArticleReq>,
) -> Result<Json<IntelligenceRecord>, ApiError> {
    let record = state.analyzer.analyze(
        &body.headline,
        &body.content,
        &body.source,
        body.published_at.as_deref(),
    )?;

    let url = body.url.filter(|u| !u.trim().is_empty());
    if let Some(u) = url.as_deref() {
        if let Some(existing) = state.store.get_by_url(u).await? {
            return Ok(Json(existing.intelligence));
        }
    }

    let article = RawArticle {
        headline: body.headline,
        content: body.content,
        source: body.source,
        url: url.clone(),
        published_at: body.published_at,
        source_type: SourceType::Manual,
    };
    match state.store.create(article, record.clone()).await {
        Ok(_) => {}
        Err(PipelineError::DuplicateUrl(u)) => {
            // lost a race with another writer; serve what won
            if let Some(existing) = state.store.get_by_url(&u).await? {
                return Ok(Json(existing.intelligence));
            }
        }
        Err(e) => {
            tracing::error!(target: "api", id = %fingerprint(&record.headline), error = %e, "manual article not stored");
            return Err(e.into());
        }
    }
    if let Err(e) = state.store.flush().await {
        tracing::warn!(target: "api", error = %e, "store flush failed");
    }
    Ok(Json(record))
}

#[derive(Serialize)]
struct BatchStarted {
    job_id: String,
    status: &'static str,
    message: String,
}

async fn ingest_batch(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Json<BatchStarted> {
    let message = format!("Batch ingestion started for source: {}", req.source_type);
    let job_id = state.coordinator.submit(req);
    Json(BatchStarted {
        job_id,
        status: "started",
        message,
    })
}

async fn ingest_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<IngestionJob>, ApiError> {
    state
        .coordinator
        .jobs()
        .get(&job_id)
        .map(Json)
        .ok_or_else(|| PipelineError::JobNotFound(job_id).into())
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    scope: Option<String>,
    news_type: Option<String>,
    source: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Serialize)]
pub struct ArticleResponse {
    pub id: u64,
    pub intelligence: IntelligenceRecord,
    pub processing_status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
}

impl From<StoredArticle> for ArticleResponse {
    fn from(a: StoredArticle) -> Self {
        Self {
            id: a.id,
            intelligence: a.intelligence,
            processing_status: a.processing_status,
            created_at: a.created_at,
        }
    }
}

#[derive(Serialize)]
struct ArticleListResponse {
    total: usize,
    page: usize,
    page_size: usize,
    articles: Vec<ArticleResponse>,
}

async fn list_articles(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ArticleListResponse>, ApiError> {
    let parse_scope = |s: &str| {
        s.parse::<Scope>()
            .map_err(|e| ApiError(PipelineError::InvalidInput(e)))
    };
    let parse_type = |s: &str| {
        s.parse::<NewsType>()
            .map_err(|e| ApiError(PipelineError::InvalidInput(e)))
    };
    let filter = ArticleFilter {
        scope: q.scope.as_deref().map(parse_scope).transpose()?,
        news_type: q.news_type.as_deref().map(parse_type).transpose()?,
        source: q.source.filter(|s| !s.trim().is_empty()),
        page: q.page.unwrap_or(1).max(1),
        page_size: q
            .page_size
            .unwrap_or(crate::store::DEFAULT_PAGE_SIZE)
            .clamp(1, crate::store::MAX_PAGE_SIZE),
    };
    let (items, total) = state.store.list(&filter).await?;
    Ok(Json(ArticleListResponse {
        total,
        page: filter.page,
        page_size: filter.page_size,
        articles: items.into_iter().map(ArticleResponse::from).collect(),
    }))
}

async fn get_article(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.store.get_by_id(id).await {
        Ok(Some(a)) => Json(ArticleResponse::from(a)).into_response(),
        Ok(None) => not_found("Article"),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn live_status(State(state): State<AppState>) -> Json<LiveStatus> {
    Json(state.monitor.status())
}

#[derive(Serialize)]
struct TriggerResp {
    status: &'static str,
    new_articles: usize,
}

async fn live_trigger(State(state): State<AppState>) -> Json<TriggerResp> {
    match state.monitor.trigger().await {
        Some(stats) => Json(TriggerResp {
            status: "triggered",
            new_articles: stats.new_articles,
        }),
        None => Json(TriggerResp {
            status: "busy",
            new_articles: 0,
        }),
    }
}

async fn live_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state.monitor))
}

/// One live subscriber: `connected` first, then broadcast events; a `stats` text gets a reply.
/// The socket is closed once the registry prunes this subscriber.
async fn handle_socket(socket: WebSocket, monitor: Arc<LiveMonitor>) {
    let (mut sender, mut receiver) = socket.split();
    let (sink, mut rx, mut pruned) = ChannelSink::watched(crate::live::subscribers::SINK_BUFFER);
    let replies = sink.clone_sender();

    if replies.send(monitor.connected_event()).await.is_err() {
        return;
    }
    let id = monitor.registry().register(Box::new(sink));

    let mut send_task = tokio::spawn(async move {
        loop {
            let ev = tokio::select! {
                ev = rx.recv() => match ev {
                    Some(ev) => ev,
                    None => break,
                },
                _ = &mut pruned => {
                    tracing::debug!(target: "live", subscriber = id, "closing pruned subscriber");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };
            match serde_json::to_string(&ev) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break; // client disconnected
                    }
                }
                Err(e) => tracing::warn!(target: "live", error = %e, "failed to encode live event"),
            }
        }
    });

    let m = Arc::clone(&monitor);
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if text.as_str().trim() == "stats" && replies.send(m.stats_event()).await.is_err()
                    {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    tracing::debug!(target: "live", error = %e, "websocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
    monitor.registry().unregister(id);
}
