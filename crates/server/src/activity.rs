//! Best-effort activity log: timestamped JSON lines appended to a local
//! file. Non-authoritative — a write failure is logged and swallowed, and
//! never blocks or fails the state transition that produced the event.

use chrono::Utc;
use serde_json::{json, Value};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct ActivityLog {
    tx: Option<mpsc::UnboundedSender<Value>>,
}

impl ActivityLog {
    /// Spawn the writer task. An empty path disables logging entirely.
    pub fn spawn(path: &str) -> Self {
        if path.is_empty() {
            return Self { tx: None };
        }
        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
        let path = path.to_string();
        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(e) = append_line(&path, &entry).await {
                    tracing::warn!("Failed to write activity log: {e}");
                }
            }
        });
        Self { tx: Some(tx) }
    }

    /// A log handle that drops everything, for tests.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn record(&self, event: &str, mut data: Value) {
        let Some(tx) = &self.tx else { return };
        if let Value::Object(map) = &mut data {
            map.insert("timestamp".into(), json!(Utc::now().to_rfc3339()));
            map.insert("event".into(), json!(event));
        }
        // Receiver gone means shutdown; nothing to do
        let _ = tx.send(data);
    }
}

async fn append_line(path: &str, entry: &Value) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{entry}\n").as_bytes()).await?;
    Ok(())
}
