//! Local mock of a vendor chat API.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use gptl::config::Config;
use gptl::llm::{ChatSession, ProviderRegistry};
use gptl::store::FileHistoryStore;
use tempfile::TempDir;

/// One request as received by the mock.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: serde_json::Value,
    captured: Arc<Mutex<Vec<Captured>>>,
}

/// A vendor stand-in answering every request with a fixed status and body.
pub struct MockVendor {
    pub base_url: String,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockVendor {
    pub async fn start(status: StatusCode, body: serde_json::Value) -> Self {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            body,
            captured: captured.clone(),
        };
        let app = Router::new().fallback(respond).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            captured,
        }
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }

    pub fn only_request(&self) -> Captured {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.into_iter().next().unwrap()
    }
}

async fn respond(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let body = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    state.captured.lock().unwrap().push(Captured {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body,
    });
    (state.status, Json(state.body.clone()))
}

/// Temp history root plus a session for `provider` pointed at `endpoint`.
pub struct Harness {
    pub tmp: TempDir,
    pub store: Arc<FileHistoryStore>,
    pub session: ChatSession,
}

impl Harness {
    pub fn new(provider: &str, endpoint: &str, model: &str) -> Self {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(FileHistoryStore::new(tmp.path().join("history")));
        let config = Config {
            provider: provider.to_string(),
            endpoint: endpoint.to_string(),
            api_key: "test-key".to_string(),
            model: model.to_string(),
            max_tokens: None,
        };
        let session = ProviderRegistry::with_builtin()
            .create(config, store.clone())
            .unwrap()
            .with_template_root(tmp.path().join("templates"));
        Self {
            tmp,
            store,
            session,
        }
    }

    pub fn history_file(&self, provider: &str, history_id: &str) -> std::path::PathBuf {
        self.store.path_for(provider, history_id).unwrap()
    }
}
