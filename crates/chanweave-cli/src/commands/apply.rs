//! Apply a stream of JSON requests to a graph
//!
//! One request per line, e.g.
//!
//! ```text
//! {"op": "CreateNode", "name": "Drain", "part_type": "Sink", "part": {"type": "int"}}
//! {"op": "ConnectPin", "node": "Drain", "pin": "input", "channel": "numbers"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Processing stops at
//! the first failing request; the requests before it stay applied and the
//! graph is saved either way.

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use chanweave_core::Request;

use super::Workspace;

/// Run the apply command; `input` of `-` reads standard input
pub async fn run(config_path: &str, graph: &str, input: &str) -> Result<()> {
    let text = if input == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read requests from stdin")?;
        text
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read requests from {}", input))?
    };

    let ws = Workspace::open(config_path)?;
    let key = ws.load(graph).await?;

    let mut applied = 0;
    let mut failure = None;
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let result = match serde_json::from_str::<Request>(line) {
            Ok(request) => {
                let op = request.op();
                ws.store
                    .apply(&key, request)
                    .await
                    .map_err(|e| anyhow::anyhow!("{} failed [{}]: {}", op, e.code(), e))
            }
            Err(e) => Err(anyhow::anyhow!("invalid request: {}", e)),
        };
        match result {
            Ok(()) => applied += 1,
            Err(e) => {
                failure = Some(e.context(format!("line {}", index + 1)));
                break;
            }
        }
    }

    ws.store
        .save(&key)
        .await
        .with_context(|| format!("Failed to save graph '{}'", graph))?;
    tracing::info!("✓ Applied {} requests to {}", applied, key);

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
