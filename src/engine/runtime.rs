// src/engine/runtime.rs

use std::fmt;

use tracing::info;

use crate::actions::ActionEnv;
use crate::diff::DiffSource;
use crate::store::WatcherStore;

use super::core::TriggerEngine;
use super::dispatch::{RunReport, dispatch_triggered};

#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Evaluate triggers but do not perform any action.
    pub dry_run: bool,
}

/// Async shell around [`TriggerEngine`].
///
/// Pulls one record at a time, evaluates it to completion, awaits every
/// action it triggered, then moves to the next record. All trigger
/// semantics live in the engine; this type only sequences IO.
pub struct Runtime<S: WatcherStore> {
    engine: TriggerEngine<S>,
    env: ActionEnv,
    options: RuntimeOptions,
}

impl<S: WatcherStore> fmt::Debug for Runtime<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("env", &self.env)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S: WatcherStore> Runtime<S> {
    pub fn new(engine: TriggerEngine<S>, env: ActionEnv, options: RuntimeOptions) -> Self {
        Self {
            engine,
            env,
            options,
        }
    }

    /// Process `source` until end of stream.
    ///
    /// Per-record failures (malformed diff, watcher lookup) are logged and
    /// skipped; action failures are collected in the returned report.
    pub async fn run(&self, source: &mut dyn DiffSource) -> RunReport {
        info!(dry_run = self.options.dry_run, "changelink runtime started");
        let mut report = RunReport::default();

        while let Some(triggered) = self.engine.evaluate_next(source) {
            report.records += 1;
            if triggered.is_empty() {
                continue;
            }

            for hit in &triggered {
                info!(
                    watcher = %hit.watcher.name,
                    file = %hit.file_path,
                    reason = %hit.evidence.reason,
                    "watcher triggered"
                );
            }

            if !self.options.dry_run {
                dispatch_triggered(&self.env, &triggered, &mut report).await;
            }
            report.triggered.extend(triggered);
        }

        info!(
            records = report.records,
            triggered = report.triggered.len(),
            performed = report.actions_performed,
            failed = report.failures.len(),
            "changelink runtime finished"
        );
        report
    }
}
