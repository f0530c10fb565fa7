//! In-process mock directory server and cloudlets

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use cloudlet_discovery::SEARCH_PATH;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RESOURCE_PATH: &str = "/api/v1/resource/";

/// Long enough to outlive any timeout used in the tests
const HANG: Duration = Duration::from_secs(30);

/// How a mock server answers
#[derive(Clone, Debug)]
pub enum Behavior {
    Respond(Value),
    Status(u16),
    Hang,
}

#[derive(Clone)]
struct MockState {
    behavior: Behavior,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<Value>>>,
}

impl MockState {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            hits: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    async fn answer(&self) -> Response {
        match &self.behavior {
            Behavior::Respond(body) => Json(body.clone()).into_response(),
            Behavior::Status(code) => StatusCode::from_u16(*code)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
                .into_response(),
            Behavior::Hang => {
                tokio::time::sleep(HANG).await;
                StatusCode::OK.into_response()
            }
        }
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A cloudlet answering resource probes
pub struct MockCloudlet {
    pub addr: SocketAddr,
    state: MockState,
}

impl MockCloudlet {
    pub async fn spawn(behavior: Behavior) -> Self {
        let state = MockState::new(behavior);
        let router = Router::new()
            .route(RESOURCE_PATH, get(cloudlet_handler))
            .with_state(state.clone());
        let addr = serve(router).await;
        Self { addr, state }
    }

    /// Cloudlet reporting `clock_mhz` and an optional cache score
    pub async fn with_resources(clock_mhz: u32, cache_score: Option<f64>) -> Self {
        let mut snapshot = json!({
            "total_cpu_num": 8,
            "total_mem_mb": 16384,
            "cpu_clock_speed_mhz": clock_mhz,
            "total_cpu_usage_percent": 12.5,
            "total_free_memory_mb": 8000,
        });
        if let Some(score) = cache_score {
            snapshot["app_cache_total_score"] = json!(score);
        }
        Self::spawn(Behavior::Respond(snapshot)).await
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Body of the last probe received
    pub fn last_request(&self) -> Option<Value> {
        self.state.last_request.lock().unwrap().clone()
    }

    /// Directory entry pointing at this cloudlet
    pub fn entry(&self) -> Value {
        json!({
            "ip_address": self.addr.ip().to_string(),
            "rest_api_port": self.addr.port(),
            "rest_api_url": RESOURCE_PATH,
            "name": format!("cloudlet-{}", self.addr.port()),
        })
    }
}

async fn cloudlet_handler(State(state): State<MockState>, body: Bytes) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Ok(request) = serde_json::from_slice::<Value>(&body) {
        *state.last_request.lock().unwrap() = Some(request);
    }
    state.answer().await
}

/// A directory server answering search queries
pub struct MockDirectory {
    pub addr: SocketAddr,
    state: MockState,
    last_query: Arc<Mutex<Option<HashMap<String, String>>>>,
}

#[derive(Clone)]
struct DirectoryState {
    inner: MockState,
    last_query: Arc<Mutex<Option<HashMap<String, String>>>>,
}

impl MockDirectory {
    pub async fn spawn(behavior: Behavior) -> Self {
        let inner = MockState::new(behavior);
        let last_query = Arc::new(Mutex::new(None));
        let router = Router::new()
            .route(SEARCH_PATH, get(directory_handler))
            .with_state(DirectoryState {
                inner: inner.clone(),
                last_query: last_query.clone(),
            });
        let addr = serve(router).await;
        Self {
            addr,
            state: inner,
            last_query,
        }
    }

    /// Directory listing the given cloudlets, in order
    pub async fn listing(cloudlets: &[&MockCloudlet]) -> Self {
        let entries: Vec<Value> = cloudlets.iter().map(|c| c.entry()).collect();
        Self::spawn(Behavior::Respond(json!({ "cloudlet": entries }))).await
    }

    /// Base URL with a trailing slash, as users usually type it
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<HashMap<String, String>> {
        self.last_query.lock().unwrap().clone()
    }
}

async fn directory_handler(
    State(state): State<DirectoryState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.inner.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_query.lock().unwrap() = Some(params);
    state.inner.answer().await
}
