//! TCP transport - newline-delimited JSON sync requests

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use pact_core::Record;
use pact_sync::SyncService;

/// TCP server delivering client payloads to the sync service.
///
/// One request per line: a JSON array of records. One response per
/// line: the fully merged JSON array, or `{"error": ...}`. Malformed
/// input gets an error line without killing the connection.
pub struct TcpServer {
    service: Arc<SyncService>,
    listener: TcpListener,
    client_counter: AtomicU64,
}

impl TcpServer {
    /// Bind the listener without starting to accept
    pub async fn bind(service: Arc<SyncService>, addr: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            service,
            listener,
            client_counter: AtomicU64::new(0),
        })
    }

    /// Address the server is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the task is dropped
    pub async fn run(self) -> std::io::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let client_id = format!(
                        "tcp:{}:{}",
                        peer_addr,
                        self.client_counter.fetch_add(1, Ordering::Relaxed)
                    );
                    let service = self.service.clone();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, client_id.clone(), service).await
                        {
                            error!(client = %client_id, error = %e, "Connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    client_id: String,
    service: Arc<SyncService>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(client = %client_id, "Client connected");

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Vec<Record>>(&line) {
            Ok(client_records) => match service.sync(client_records).await {
                Ok(merged) => serde_json::to_string(&merged)?,
                Err(e) => {
                    error!(client = %client_id, error = %e, "Sync failed");
                    error_line(&e.to_string())
                }
            },
            Err(e) => {
                warn!(client = %client_id, error = %e, "Rejected malformed payload");
                error_line(&format!("Invalid payload: {}", e))
            }
        };

        writer.write_all(response.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    info!(client = %client_id, "Client disconnected");
    Ok(())
}

fn error_line(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pact_store::MemoryStore;
    use serde_json::{json, Value};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    async fn start_server() -> SocketAddr {
        let service = Arc::new(SyncService::new(Arc::new(MemoryStore::new())));
        let server = TcpServer::bind(service, "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());
        addr
    }

    async fn request(addr: SocketAddr, line: &str) -> Value {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer.write_all(line.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();

        let response = lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[tokio::test]
    async fn test_sync_round_trip() {
        let addr = start_server().await;

        let response = request(
            addr,
            r#"[{"id": "a", "logs": ["x"], "title": "Daily programming"}]"#,
        )
        .await;

        assert_eq!(
            response,
            json!([{
                "id": "a",
                "logs": ["x"],
                "failureLogs": [],
                "title": "Daily programming"
            }])
        );
    }

    #[tokio::test]
    async fn test_second_client_converges() {
        let addr = start_server().await;

        request(addr, r#"[{"id": "a", "logs": ["x"]}]"#).await;
        let response = request(addr, r#"[{"id": "a", "logs": ["y"]}]"#).await;

        assert_eq!(response[0]["logs"], json!(["x", "y"]));
    }

    #[tokio::test]
    async fn test_malformed_payload_gets_error_line() {
        let addr = start_server().await;

        let response = request(addr, "{not json").await;
        assert!(response.get("error").is_some());

        // The server keeps serving; valid requests still work
        let response = request(addr, r#"[{"id": "b"}]"#).await;
        assert_eq!(response[0]["id"], json!("b"));
    }
}
