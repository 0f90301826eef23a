//! gofmt integration

use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Format Go source by piping it through `gofmt`.
///
/// `file` only labels errors.
pub async fn gofmt(gofmt: &str, file: &str, source: &str) -> Result<String> {
    let mut child = Command::new(gofmt)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Format {
            file: file.to_string(),
            message: format!("failed to run {}: {}", gofmt, e),
        })?;

    let mut stdin = child.stdin.take().ok_or_else(|| Error::Format {
        file: file.to_string(),
        message: "gofmt stdin unavailable".to_string(),
    })?;
    let input = source.as_bytes().to_vec();
    let writer = tokio::spawn(async move {
        let result = stdin.write_all(&input).await;
        drop(stdin);
        result
    });

    let output = child.wait_with_output().await?;
    let written = writer.await;

    if !output.status.success() {
        return Err(Error::Format {
            file: file.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    written.map_err(|e| Error::Format {
        file: file.to_string(),
        message: e.to_string(),
    })??;
    String::from_utf8(output.stdout).map_err(|e| Error::Format {
        file: file.to_string(),
        message: e.to_string(),
    })
}
