//! Persisted NDJSON report writer: one JSON object per line, appended on
//! every hourly tick and once more on shutdown.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::CoreError;

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry<'a> {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub chain_id: u64,
    pub total_trades: usize,
    pub successful_trades: usize,
    pub net_profit_usd: f64,
    pub gas_spent_usd: f64,
    pub circuit_breaker_state: &'a str,
}

pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn append(&self, entry: &ReportEntry<'_>) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CoreError::ConfigInvalid(format!("cannot create report directory: {e}"))
            })?;
        }
        let mut line = serde_json::to_string(entry).map_err(|e| {
            CoreError::InvalidResponse {
                call: "report::append".into(),
                detail: e.to_string(),
            }
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| CoreError::ConfigInvalid(format!("cannot open report file: {e}")))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| CoreError::ConfigInvalid(format!("cannot write report file: {e}")))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Synchronous variant used at process-exit time (the Terminate path),
/// where spawning another async write isn't guaranteed to complete before
/// the runtime drops.
pub fn append_blocking(path: &Path, entry: &ReportEntry<'_>) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CoreError::ConfigInvalid(format!("cannot create report directory: {e}")))?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| CoreError::ConfigInvalid(format!("cannot open report file: {e}")))?;
    let mut line = serde_json::to_string(entry).map_err(|e| CoreError::InvalidResponse {
        call: "report::append_blocking".into(),
        detail: e.to_string(),
    })?;
    line.push('\n');
    file.write_all(line.as_bytes())
        .map_err(|e| CoreError::ConfigInvalid(format!("cannot write report file: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_one_json_line_per_entry() {
        let dir = std::env::temp_dir().join(format!("dexarb-report-test-{}", std::process::id()));
        let path = dir.join("report.ndjson");
        let writer = ReportWriter::new(&path);
        let entry = ReportEntry {
            generated_at: chrono::Utc::now(),
            chain_id: 42161,
            total_trades: 3,
            successful_trades: 2,
            net_profit_usd: 12.5,
            gas_spent_usd: 1.1,
            circuit_breaker_state: "Armed",
        };
        writer.append(&entry).await.unwrap();
        writer.append(&entry).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.lines().count(), 2);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
