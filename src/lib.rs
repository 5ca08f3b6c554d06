// src/lib.rs

pub mod actions;
pub mod cli;
pub mod config;
pub mod diff;
pub mod engine;
pub mod errors;
pub mod git;
pub mod logging;
pub mod matching;
pub mod store;
pub mod types;
pub mod watcher;

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::actions::ActionEnv;
use crate::actions::http::ReqwestClient;
use crate::cli::{CliArgs, DiffInput};
use crate::diff::DiffReader;
use crate::engine::{RunReport, Runtime, RuntimeOptions, TriggerEngine};
use crate::store::LocalStore;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config / watcher store loading
/// - reading the diff (stdin, file, or git)
/// - the trigger engine and its async runtime
/// - the HTTP client used by actions
///
/// Returns the run report; the caller decides the exit status.
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let store = LocalStore::open(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    let cfg = store.config();
    let http = ReqwestClient::new(Duration::from_secs(cfg.config.http_timeout_secs))?;
    let env = ActionEnv::from_config(&cfg.integrations, Arc::new(http));
    debug!(?env, "action environment ready");

    let diff = read_diff(&args.diff_input()).await?;
    info!(bytes = diff.len(), "diff loaded");

    let options = RuntimeOptions {
        dry_run: args.dry_run,
    };
    let runtime = Runtime::new(TriggerEngine::new(store), env, options);

    let mut source = DiffReader::new(Cursor::new(diff));
    let report = runtime.run(&mut source).await;

    print_report(&report, args.dry_run);
    Ok(report)
}

/// Raw diff bytes. Decoding is left to the reader, so non-UTF-8 hunk lines
/// do not fail the run.
async fn read_diff(input: &DiffInput) -> Result<Vec<u8>> {
    let bytes = match input {
        DiffInput::Stdin => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("reading diff from stdin")?;
            buf
        }
        DiffInput::File(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("reading diff from {}", path.display()))?,
        DiffInput::GitWorkingTree => git::diff_working_tree(Path::new("."))
            .await?
            .into_bytes(),
        DiffInput::GitBranch(branch) => git::diff_against_branch(Path::new("."), branch)
            .await?
            .into_bytes(),
    };
    Ok(bytes)
}

/// Print the run summary to stdout. Action failures are listed once, here.
fn print_report(report: &RunReport, dry_run: bool) {
    if dry_run {
        println!("changelink dry-run");
    }
    println!(
        "records: {}, triggered: {}, actions performed: {}, failed: {}",
        report.records,
        report.triggered.len(),
        report.actions_performed,
        report.failures.len()
    );

    for hit in &report.triggered {
        let lines = hit
            .evidence
            .changed
            .map(|r| format!(" (lines {r})"))
            .unwrap_or_default();
        println!(
            "  - {} [{}]: {}{}",
            hit.watcher.name, hit.file_path, hit.evidence.reason, lines
        );
        if dry_run {
            for action in &hit.watcher.actions {
                println!("      would run {} '{}'", action.action_type(), action.name());
            }
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!("errors:");
        for failure in &report.failures {
            println!("  - {}", failure.error);
        }
    }
}
