// Common test utilities and helpers for integration tests
#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use enochecker_core::api::CheckerServer;
use enochecker_core::config::EnoConfigBuilder;
use enochecker_core::registry::CheckerRegistry;
use enochecker_core::types::{TaskDescription, TaskDescriptionBuilder, TaskMethod};

/// Get a timeout multiplier based on the environment
/// CI environments often need longer timeouts due to resource constraints
pub fn timeout_multiplier() -> u32 {
    if std::env::var("CI").is_ok() {
        return 3;
    }
    std::env::var("TEST_TIMEOUT_MULTIPLIER")
        .ok()
        .and_then(|m| m.parse().ok())
        .unwrap_or(1)
}

/// Apply the timeout multiplier to a duration
pub fn scaled_timeout(base: Duration) -> Duration {
    base * timeout_multiplier()
}

/// A port nothing listens on
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Accept one connection, write `chunks` with `gap` between them, then
/// either close or hold the socket open for a minute
pub async fn serve_chunks(chunks: Vec<Vec<u8>>, gap: Duration, hold_open: bool) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        for chunk in chunks {
            if socket.write_all(&chunk).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
            if !gap.is_zero() {
                tokio::time::sleep(gap).await;
            }
        }
        if hold_open {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    });
    port
}

/// Accept one connection, read exactly `expected` bytes, answer `done\n`
pub async fn serve_sink(expected: usize) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; expected];
        socket.read_exact(&mut buf).await.unwrap();
        socket.write_all(b"done\n").await.unwrap();
    });
    port
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBehavior {
    /// Stores and returns values faithfully
    Honest,
    /// Accepts SET but answers every GET with garbage
    Forgetful,
    /// Reads requests and never answers
    Silent,
}

/// In-process line-oriented key/value service
pub struct LineStoreService {
    pub port: u16,
    store: Arc<Mutex<HashMap<String, String>>>,
    handle: JoinHandle<()>,
}

impl LineStoreService {
    pub async fn start(behavior: StoreBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let store: Arc<Mutex<HashMap<String, String>>> = Arc::default();

        let shared = store.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let store = shared.clone();
                tokio::spawn(async move {
                    let (reader, mut writer) = socket.into_split();
                    let mut lines = BufReader::new(reader).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        if behavior == StoreBehavior::Silent {
                            continue;
                        }
                        let reply = respond(&store, behavior, &line);
                        if writer.write_all(reply.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });

        Self { port, store, handle }
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.store.lock().get(key).cloned()
    }
}

impl Drop for LineStoreService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn respond(store: &Mutex<HashMap<String, String>>, behavior: StoreBehavior, line: &str) -> String {
    let mut parts = line.splitn(3, ' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("SET"), Some(key), Some(value)) => {
            store.lock().insert(key.to_string(), value.to_string());
            "OK\n".to_string()
        }
        (Some("GET"), Some(_), None) if behavior == StoreBehavior::Forgetful => "???\n".to_string(),
        (Some("GET"), Some(key), None) => {
            format!("{}\n", store.lock().get(key).cloned().unwrap_or_default())
        }
        (Some("PING"), None, None) => "PONG\n".to_string(),
        _ => "ERR\n".to_string(),
    }
}

/// Checker service on a loopback port, stopped on drop
pub struct TestService {
    pub base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestService {
    pub async fn start(checker: &str, service_port: u16) -> Self {
        let config = EnoConfigBuilder::new()
            .bind_address("127.0.0.1:0")
            .checker(checker)
            .service_port(service_port)
            .build()
            .unwrap();
        let server = CheckerServer::from_config(config, &CheckerRegistry::with_builtins()).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .serve_on(listener, async {
                    let _ = rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            base_url,
            shutdown: Some(tx),
            handle,
        }
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

/// Task against the loopback address with a short timeout
pub fn task_builder(method: TaskMethod) -> TaskDescriptionBuilder {
    let builder = TaskDescription::builder(method, "127.0.0.1")
        .task_id(1)
        .team(3, "loopback")
        .service_id(1)
        .rounds(5, 5)
        .timeout(Duration::from_secs(2));
    if method.requires_flag() {
        builder.flag("ENOFLAGtest")
    } else {
        builder
    }
}

pub fn task(method: TaskMethod) -> TaskDescription {
    task_builder(method).build().unwrap()
}
