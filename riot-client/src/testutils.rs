//! Scripted loopback upstream used by the executor and client tests.

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

pub struct MockResponse {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl MockResponse {
    pub fn json(body: &str) -> Self {
        MockResponse {
            status: 200,
            headers: vec![("content-type", "application/json".to_string())],
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        MockResponse {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }
}

impl IntoResponse for MockResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap();
        let mut response = (status, self.body).into_response();
        for (name, value) in self.headers {
            response
                .headers_mut()
                .insert(name, HeaderValue::from_str(&value).unwrap());
        }
        response
    }
}

/// Receives the request path and the 1-based hit count for that path.
type Script = dyn Fn(&str, usize) -> MockResponse + Send + Sync;

struct MockState {
    script: Box<Script>,
    delay: Option<Duration>,
    hits: Mutex<HashMap<String, usize>>,
    headers: Mutex<HashMap<String, HeaderMap>>,
}

pub struct MockUpstream {
    base_url: Url,
    state: Arc<MockState>,
}

impl MockUpstream {
    pub async fn start<F>(script: F) -> Self
    where
        F: Fn(&str, usize) -> MockResponse + Send + Sync + 'static,
    {
        Self::spawn(None, Box::new(script)).await
    }

    /// Like `start`, but every response is held back for `delay`.
    pub async fn start_slow<F>(delay: Duration, script: F) -> Self
    where
        F: Fn(&str, usize) -> MockResponse + Send + Sync + 'static,
    {
        Self::spawn(Some(delay), Box::new(script)).await
    }

    async fn spawn(delay: Option<Duration>, script: Box<Script>) -> Self {
        let state = Arc::new(MockState {
            script,
            delay,
            hits: Mutex::new(HashMap::new()),
            headers: Mutex::new(HashMap::new()),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = Router::new().fallback(dispatch).with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockUpstream {
            base_url: Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap(),
            state,
        }
    }

    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    pub fn url(&self, path_and_query: &str) -> Url {
        self.base_url.join(path_and_query).unwrap()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.state
            .hits
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().unwrap().values().sum()
    }

    pub fn last_header(&self, path: &str, name: &str) -> Option<String> {
        self.state
            .headers
            .lock()
            .unwrap()
            .get(path)
            .and_then(|headers| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

async fn dispatch(State(state): State<Arc<MockState>>, uri: Uri, headers: HeaderMap) -> Response {
    let path = uri.path().to_string();
    let hit = {
        let mut hits = state.hits.lock().unwrap();
        let count = hits.entry(path.clone()).or_insert(0);
        *count += 1;
        *count
    };
    state
        .headers
        .lock()
        .unwrap()
        .insert(path.clone(), headers);

    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    (state.script)(&path, hit).into_response()
}
