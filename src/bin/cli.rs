//! listpager CLI
//!
//! Export every member of an X list to JSON Lines and CSV, resuming from the
//! last checkpoint after interruptions or rate limits.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use listpager::{
    error::{AppError, Result},
    models::Config,
    pipeline::{self, LoopState, StopReason},
    services::XApiClient,
    storage::{CheckpointStore, LocalCheckpointStore},
    utils::{self, log as report, url::resolve_list_id},
};

/// listpager - resumable X list member exporter
#[derive(Parser, Debug)]
#[command(name = "listpager", version, about = "Resumable X list member exporter")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "listpager.toml", global = true)]
    config: PathBuf,

    /// Override the output directory
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Use one fixed checkpoint file (relative to the working directory)
    /// instead of `checkpoint_{id}.json` in the output directory
    #[arg(long, global = true)]
    checkpoint: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export all members of a list (URL or numeric id)
    Export {
        /// List URL (https://x.com/i/lists/<id>) or bare id
        target: String,

        /// Stop cleanly after this many pages; rerun to continue
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_pages: Option<u64>,

        /// Override the pause between pages, in milliseconds
        #[arg(long)]
        page_delay_ms: Option<u64>,
    },

    /// Show the stored checkpoint without touching the network
    Status {
        /// List URL or id; optional when a fixed checkpoint file is used
        target: Option<String>,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flags.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(&cli.config);
    if let Some(dir) = cli.output_dir {
        config.output.dir = dir;
    }
    if let Some(path) = cli.checkpoint {
        config.output.override_checkpoint(&path)?;
    }

    match cli.command {
        Command::Export {
            target,
            max_pages,
            page_delay_ms,
        } => {
            if let Some(ms) = page_delay_ms {
                config.pacing.page_delay_ms = ms;
            }
            if let Err(e) = export(&config, &target, max_pages).await {
                log::error!("Export failed: {e}");
                return Err(e);
            }
        }

        Command::Status { target } => {
            let list_id = target.as_deref().map(resolve_list_id).transpose()?;
            status(&config, list_id.as_deref()).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}

async fn export(config: &Config, target: &str, max_pages: Option<u64>) -> Result<()> {
    config.validate()?;
    let list_id = resolve_list_id(target)?;
    let token = utils::read_bearer_token(&config.api.token_env)?;
    let client = XApiClient::new(&config.api, token)?;

    report::header(&format!("Exporting list {list_id}"));
    let summary = pipeline::run_export(config, &client, &list_id, max_pages)
        .await
        .inspect_err(|e| {
            if e.is_remote() {
                log::warn!(
                    "Checkpoint at {} is unchanged; rerun to resume",
                    config.output.checkpoint_path(&list_id).display()
                );
            }
        })?;
    let run = &summary.report;

    report::summary(
        &format!("{} ({})", summary.list.name, summary.list.id),
        &[
            ("Result", run.stop.to_string()),
            ("Pages this run", run.pages_written.to_string()),
            ("Records this run", run.records_written.to_string()),
            ("Records total", run.state.total_written.to_string()),
            ("Rate-limit waits", run.rate_limit_waits.to_string()),
            ("JSONL", summary.records_path.display().to_string()),
            ("CSV", summary.table_path.display().to_string()),
            ("Checkpoint", summary.checkpoint_path.display().to_string()),
        ],
    );
    if run.stop == StopReason::PageLimit {
        log::info!("Rerun the same command to continue from page {}", run.state.page);
    }
    Ok(())
}

async fn status(config: &Config, list_id: Option<&str>) -> Result<()> {
    let path = match (list_id, &config.output.checkpoint_file) {
        (Some(id), _) => config.output.checkpoint_path(id),
        (None, Some(_)) => config.output.checkpoint_path(""),
        (None, None) => {
            return Err(AppError::config(
                "status needs a list id unless a fixed checkpoint file is configured",
            ));
        }
    };
    let store = LocalCheckpointStore::new(&path);
    let Some(cp) = store.load(list_id.unwrap_or_default()).await? else {
        log::info!("No checkpoint at {}", path.display());
        return Ok(());
    };

    report::summary(
        &format!("Checkpoint {}", path.display()),
        &[
            ("List", cp.collection_id.clone()),
            ("Next page", cp.page.to_string()),
            ("Records written", cp.total_written.to_string()),
            (
                "Resume token",
                if cp.resume_token.is_some() { "present" } else { "absent" }.to_string(),
            ),
            ("Complete", LoopState::from(&cp).is_exhausted().to_string()),
            ("Last event", cp.last_event.to_string()),
            ("Last wait", format!("{}s", cp.last_wait_seconds)),
            ("Updated", cp.updated_at.to_rfc3339()),
        ],
    );

    if let Some(id) = list_id {
        if !cp.belongs_to(id) {
            return Err(AppError::config(format!(
                "checkpoint belongs to list {}, not {id}; an export of {id} would start fresh",
                cp.collection_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_VAR: &str = "LISTPAGER_CLI_TEST_TOKEN";

    fn write_config(dir: &TempDir, server: &MockServer) -> PathBuf {
        let path = dir.path().join("listpager.toml");
        let body = format!(
            r#"
[api]
base_url = "{}/2"
token_env = "{TOKEN_VAR}"

[pacing]
page_delay_ms = 0
"#,
            server.uri()
        );
        std::fs::write(&path, body).unwrap();
        path
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("listpager").chain(args.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn server_error_fails_export_without_checkpoint() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/2/lists/42"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"data":{"id":"42","name":"x"}}"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/2/lists/42/members"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .expect(1)
            .mount(&server)
            .await;

        // SAFETY: no other test in this binary reads or writes the environment.
        unsafe { std::env::set_var(TOKEN_VAR, "secret") };
        let config = write_config(&dir, &server);
        let out = dir.path().join("out");
        let cli = parse(&[
            "--config",
            config.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "export",
            "https://x.com/i/lists/42",
        ]);

        let err = run(cli).await.unwrap_err();
        assert!(matches!(err, AppError::Api { status: 500, .. }));
        assert!(!out.join("checkpoint_42.json").exists());
    }

    #[tokio::test]
    async fn status_without_list_needs_fixed_checkpoint() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let cli = parse(&[
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "status",
        ]);

        assert!(matches!(run(cli).await, Err(AppError::Config(_))));
    }
}
