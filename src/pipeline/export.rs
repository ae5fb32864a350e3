// src/pipeline/export.rs

//! List export pipeline: metadata, output naming, then pagination.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, ListInfo, error_detail};
use crate::pipeline::backoff::{Backoff, Verdict};
use crate::pipeline::paginate::{PaginationSettings, Paginator, RunReport};
use crate::services::CollectionClient;
use crate::storage::{CsvSink, JsonlSink, LocalCheckpointStore, RecordSink};
use crate::utils::sanitize_name;

/// Where an export wrote its data, plus the driver's report.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub list: ListInfo,
    pub report: RunReport,
    pub records_path: PathBuf,
    pub table_path: PathBuf,
    pub checkpoint_path: PathBuf,
}

/// Fetch list metadata, waiting out rate limits like the page loop does.
pub async fn fetch_list_info(
    client: &dyn CollectionClient,
    backoff: &Backoff,
    list_id: &str,
) -> Result<ListInfo> {
    loop {
        let response = client.fetch_metadata(list_id).await?;
        let now = Utc::now().timestamp();
        match backoff.classify(response.status, response.rate_limit_reset.as_deref(), now) {
            Verdict::Success => return ListInfo::parse(&response.body),
            Verdict::RateLimited { wait_secs, .. } => {
                log::warn!("Rate limited fetching list {list_id} metadata, waiting {wait_secs}s");
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
            }
            Verdict::Fatal { status } => {
                return Err(AppError::api(status, error_detail(&response.body)));
            }
        }
    }
}

/// Export every member of `list_id` into the configured output directory.
pub async fn run_export(
    config: &Config,
    client: &dyn CollectionClient,
    list_id: &str,
    max_pages: Option<u64>,
) -> Result<ExportSummary> {
    let settings = PaginationSettings {
        max_pages,
        ..PaginationSettings::from_config(config)
    };

    let list = fetch_list_info(client, &settings.backoff, list_id).await?;
    log::info!("List {}: \"{}\"", list.id, list.name);

    let stem = format!("{}_{}", sanitize_name(&list.name), list_id);
    let records_path = config.output.records_path(&stem);
    let table_path = config.output.table_path(&stem);
    let checkpoint_path = config.output.checkpoint_path(list_id);
    tokio::fs::create_dir_all(&config.output.dir).await?;

    let store = LocalCheckpointStore::new(&checkpoint_path);
    let jsonl = JsonlSink::new(&records_path);
    let csv = CsvSink::new(&table_path);

    let sinks = vec![&jsonl as &dyn RecordSink, &csv];
    let report = Paginator::new(client, &store, sinks, settings)
        .run(list_id)
        .await?;

    Ok(ExportSummary {
        list,
        report,
        records_path,
        table_path,
        checkpoint_path,
    })
}
