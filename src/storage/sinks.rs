//! Append-only record sinks.
//!
//! Each `write` call serializes the whole page in memory and appends it with
//! a single write, followed by a data sync, so the page is on disk before the
//! caller commits its checkpoint.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Record, TABLE_HEADER};
use crate::storage::RecordSink;

/// Append bytes to `path`, creating the file and its parent if needed.
async fn append_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_data().await?;
    Ok(())
}

/// Whether `path` is missing or has no content yet.
async fn is_fresh(path: &Path) -> Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// JSON Lines sink: one serialized record per line.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn write(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut buf = Vec::with_capacity(records.len() * 128);
        for record in records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }
        append_bytes(&self.path, &buf).await
    }
}

/// CSV sink: header row once per destination, then one row per record.
///
/// The header decision is made from the file itself, so a destination that
/// already holds rows from an earlier run never gets a second header.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(records: &[Record], with_header: bool) -> Result<Vec<u8>> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        if with_header {
            wtr.write_record(TABLE_HEADER)?;
        }
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.into_inner().map_err(|e| AppError::Io(e.into_error()))
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    async fn write(&self, records: &[Record]) -> Result<()> {
        let with_header = is_fresh(&self.path).await?;
        if records.is_empty() && !with_header {
            return Ok(());
        }
        let bytes = Self::encode(records, with_header)?;
        append_bytes(&self.path, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(handle: &str, id: &str) -> Record {
        Record {
            handle: handle.to_string(),
            display_name: format!("{handle} display"),
            id: id.to_string(),
            verified: false,
            followers_count: 5,
            following_count: 7,
        }
    }

    #[tokio::test]
    async fn test_jsonl_appends_in_order() {
        let tmp = TempDir::new().unwrap();
        let sink = JsonlSink::new(tmp.path().join("out.jsonl"));

        sink.write(&[record("a", "1"), record("b", "2")]).await.unwrap();
        sink.write(&[record("c", "3")]).await.unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let handles: Vec<String> = content
            .lines()
            .map(|l| serde_json::from_str::<Record>(l).unwrap().handle)
            .collect();
        assert_eq!(handles, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_jsonl_field_names() {
        let tmp = TempDir::new().unwrap();
        let sink = JsonlSink::new(tmp.path().join("out.jsonl"));
        sink.write(&[record("a", "1")]).await.unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(value["handle"], "a");
        assert_eq!(value["displayName"], "a display");
        assert_eq!(value["followersCount"], 5);
        assert_eq!(value["followingCount"], 7);
    }

    #[tokio::test]
    async fn test_csv_header_written_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.csv");

        for i in 0..3 {
            let sink = CsvSink::new(&path);
            sink.write(&[record("user", &i.to_string())]).await.unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "handle,displayName,id,verified,followersCount,followingCount"
        );
        assert_eq!(lines.len(), 4);
        assert_eq!(
            content.matches("handle,displayName").count(),
            1,
            "header repeated: {content}"
        );
        assert_eq!(lines[1], "user,user display,0,false,5,7");
    }

    #[tokio::test]
    async fn test_csv_empty_first_page_still_writes_header() {
        let tmp = TempDir::new().unwrap();
        let sink = CsvSink::new(tmp.path().join("out.csv"));

        sink.write(&[]).await.unwrap();
        sink.write(&[]).await.unwrap();
        sink.write(&[record("a", "1")]).await.unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_csv_quotes_commas_in_names() {
        let tmp = TempDir::new().unwrap();
        let sink = CsvSink::new(tmp.path().join("out.csv"));
        let mut r = record("a", "1");
        r.display_name = "Doe, Jane".to_string();
        sink.write(&[r]).await.unwrap();

        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert!(content.contains("\"Doe, Jane\""));
    }
}
