// Common test utilities for tmnode integration tests
#![allow(dead_code)]

use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tmnode::Settings;

/// Write an executable `tendermint` shell script into `dir` and return its path.
pub fn fake_binary(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("tendermint");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write fake binary");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake binary");
    path
}

/// Settings tuned for tests: fast polling, short drain grace, no forwarding.
pub fn test_settings(binary: PathBuf) -> Settings {
    let mut settings = Settings::with_binary(binary);
    settings.poll_interval = Duration::from_millis(50);
    settings.drain_grace = Duration::from_millis(200);
    settings.started_timeout = Duration::from_secs(5);
    settings
}

/// A port nothing is listening on (bound then released).
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port()
}

/// Poll `path` until it exists, for processes that report through files.
pub async fn wait_for_file(path: &Path, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    path.exists()
}

/// Shared state of the mock RPC server.
#[derive(Default)]
pub struct MockState {
    pub calls: AtomicU32,
    /// Answer 503 instead of a status reply.
    pub unavailable: AtomicBool,
    pub catching_up: AtomicBool,
    pub height: AtomicU64,
}

/// A stand-in for a node's RPC server that only knows `/status`.
pub struct MockRpc {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockRpc {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/status", get(status))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock rpc");
        let addr = listener.local_addr().expect("mock rpc addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock rpc server");
        });

        Self { addr, state }
    }

    /// Value for a `laddr` option pointing the supervisor at this server.
    pub fn laddr(&self) -> String {
        format!("tcp://0.0.0.0:{}", self.addr.port())
    }

    pub fn calls(&self) -> u32 {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn set_sync(&self, catching_up: bool, height: u64) {
        self.state.catching_up.store(catching_up, Ordering::SeqCst);
        self.state.height.store(height, Ordering::SeqCst);
    }
}

async fn status(State(state): State<Arc<MockState>>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    if state.unavailable.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, "booting").into_response();
    }

    Json(serde_json::json!({
        "jsonrpc": "2.0",
        "id": -1,
        "result": {
            "node_info": { "network": "test-chain" },
            "sync_info": {
                "latest_block_height": state.height.load(Ordering::SeqCst).to_string(),
                "catching_up": state.catching_up.load(Ordering::SeqCst),
            }
        }
    }))
    .into_response()
}
