//! Fakes of the match backend: an in-process HTTP server and an in-memory
//! `MatchApi` that counts calls.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use shared::{
    domain::{MatchId, MatchStatus, UserId},
    error::ApiError,
    protocol::{CompareResponse, Match, RespondRequest},
};
use tokio::{
    net::TcpListener,
    sync::{Mutex, Notify},
};

use crate::{
    api::{ApiResult, MatchApi},
    error::MatchActionError,
};

pub const CREATOR: UserId = UserId(100);
pub const INVITED: UserId = UserId(200);
pub const MATCH_ID: MatchId = MatchId(7);

pub fn sample_match(status: MatchStatus) -> Match {
    Match {
        id: MATCH_ID,
        creator_id: CREATOR,
        invited_id: INVITED,
        status,
        creator_score: None,
        invited_score: None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedRespond {
    pub accept: Option<String>,
    pub photo_filename: Option<String>,
    pub photo_mime: Option<String>,
    pub photo_bytes: Option<Vec<u8>>,
}

#[derive(Default)]
pub struct BackendInner {
    pub snapshot: Option<Match>,
    pub fetch_calls: u32,
    pub respond_calls: Vec<RecordedRespond>,
    pub compare_calls: u32,
    pub respond_failure: Option<(StatusCode, String)>,
    pub compare_failure: Option<(StatusCode, String)>,
    pub compare_scores: Option<CompareResponse>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    pub inner: Arc<Mutex<BackendInner>>,
    /// When set, compare waits for a permit before answering.
    pub compare_gate: Option<Arc<Notify>>,
}

impl FakeBackend {
    pub fn with_snapshot(snapshot: Match) -> Self {
        let backend = Self::default();
        backend
            .inner
            .try_lock()
            .expect("fresh backend lock")
            .snapshot = Some(snapshot);
        backend
    }

    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.compare_gate = Some(Arc::clone(&gate));
        (self, gate)
    }
}

async fn get_match(State(backend): State<FakeBackend>, Path(id): Path<i64>) -> Response {
    let mut inner = backend.inner.lock().await;
    inner.fetch_calls += 1;
    match inner.snapshot.clone() {
        Some(snapshot) if snapshot.id.0 == id => Json(snapshot).into_response(),
        _ => (StatusCode::NOT_FOUND, "match not found").into_response(),
    }
}

async fn respond(
    State(backend): State<FakeBackend>,
    Path(_id): Path<i64>,
    mut multipart: Multipart,
) -> Response {
    let mut recorded = RecordedRespond::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "accept" => recorded.accept = field.text().await.ok(),
            "photo" => {
                recorded.photo_filename = field.file_name().map(str::to_string);
                recorded.photo_mime = field.content_type().map(str::to_string);
                recorded.photo_bytes = field.bytes().await.ok().map(|b| b.to_vec());
            }
            _ => {}
        }
    }

    let mut inner = backend.inner.lock().await;
    let accepted = recorded.accept.as_deref() == Some("true");
    inner.respond_calls.push(recorded);
    if let Some((status, body)) = inner.respond_failure.clone() {
        return (status, body).into_response();
    }
    if accepted {
        if let Some(snapshot) = inner.snapshot.as_mut() {
            snapshot.status = MatchStatus::Ready;
        }
    }
    StatusCode::OK.into_response()
}

async fn compare(State(backend): State<FakeBackend>, Path(_id): Path<i64>) -> Response {
    if let Some(gate) = &backend.compare_gate {
        gate.notified().await;
    }

    let mut inner = backend.inner.lock().await;
    inner.compare_calls += 1;
    if let Some((status, body)) = inner.compare_failure.clone() {
        return (status, body).into_response();
    }
    let scores = inner.compare_scores.unwrap_or(CompareResponse {
        creator_score: 8.0,
        invited_score: 6.5,
    });
    if let Some(snapshot) = inner.snapshot.as_mut() {
        snapshot.status = MatchStatus::Completed;
        snapshot.creator_score = Some(scores.creator_score);
        snapshot.invited_score = Some(scores.invited_score);
    }
    Json(scores).into_response()
}

pub async fn spawn_backend(backend: FakeBackend) -> anyhow::Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/api/matches/:id", get(get_match))
        .route("/api/matches/:id/respond", post(respond))
        .route("/api/matches/:id/compare", post(compare))
        .with_state(backend);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

/// Address nothing listens on, for network failure paths.
pub async fn unreachable_server_url() -> anyhow::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{addr}"))
}

#[derive(Default)]
pub struct CountingApi {
    pub snapshot: Mutex<Option<Match>>,
    pub fetch_calls: AtomicUsize,
    pub respond_requests: Mutex<Vec<RespondRequest>>,
    pub compare_calls: AtomicUsize,
    /// When set, respond records the request and then waits for a permit.
    pub respond_gate: Option<Arc<Notify>>,
}

impl CountingApi {
    pub fn with_snapshot(snapshot: Match) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        })
    }

    pub fn with_gated_respond(snapshot: Match) -> (Arc<Self>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(Self {
            snapshot: Mutex::new(Some(snapshot)),
            respond_gate: Some(Arc::clone(&gate)),
            ..Self::default()
        });
        (api, gate)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn compares(&self) -> usize {
        self.compare_calls.load(Ordering::SeqCst)
    }

    pub async fn responds(&self) -> usize {
        self.respond_requests.lock().await.len()
    }
}

#[async_trait]
impl MatchApi for CountingApi {
    async fn fetch_match(&self, match_id: MatchId) -> ApiResult<Match> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match self.snapshot.lock().await.clone() {
            Some(snapshot) if snapshot.id == match_id => Ok(snapshot),
            _ => Err(MatchActionError::Rejected(ApiError::new(
                404,
                "match not found",
            ))),
        }
    }

    async fn respond(&self, _match_id: MatchId, request: RespondRequest) -> ApiResult<()> {
        self.respond_requests.lock().await.push(request);
        if let Some(gate) = &self.respond_gate {
            gate.notified().await;
        }
        Ok(())
    }

    async fn compare(&self, _match_id: MatchId) -> ApiResult<CompareResponse> {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CompareResponse {
            creator_score: 8.0,
            invited_score: 6.5,
        })
    }
}
