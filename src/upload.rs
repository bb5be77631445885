// Batch upload engine. Records go out strictly in order over one
// connection; a pacer spaces the POSTs instead of the fixed sleeps the
// old shell one-liners used, and retryable failures (429, 5xx, dropped
// connections) get a short exponential backoff before the record is
// counted as failed. Rejections are terminal and are never resent.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::ProgressBar;
use serde_json::Value;

use crate::api::{ApiClient, Outcome};
use crate::catalog::{self, Dataset};
use crate::remap::JsonMap;
use crate::report::{RunReport, Tally};
use crate::ui;

/// Default minimum spacing between POSTs.
pub const DEFAULT_PACE: Duration = Duration::from_millis(250);

/// Spaces requests out to a steady rate. `wait` returns immediately the
/// first time, then sleeps off whatever remains of the interval since
/// the previous call.
pub struct Pacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Pacer {
            interval,
            last: None,
        }
    }

    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Retry budget for outcomes the instance may recover from. `attempts`
/// counts the first try too; delays double per retry up to `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map(|d| d.min(self.max_delay))
            .unwrap_or(self.max_delay)
    }
}

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub pace: Duration,
    pub retry: RetryPolicy,
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            pace: DEFAULT_PACE,
            retry: RetryPolicy::default(),
            show_progress: true,
        }
    }
}

impl BatchOptions {
    /// No pacing, no backoff sleeps, no progress bar. For tests.
    pub fn immediate() -> Self {
        BatchOptions {
            pace: Duration::ZERO,
            retry: RetryPolicy {
                attempts: 3,
                base_delay: Duration::ZERO,
                max_delay: Duration::ZERO,
            },
            show_progress: false,
        }
    }
}

/// Pace one submission and retry it while the outcome stays retryable
/// and budget remains. The final outcome is whatever the last attempt
/// produced.
pub fn submit_with_retry<F>(pacer: &mut Pacer, policy: &RetryPolicy, mut submit: F) -> Outcome
where
    F: FnMut() -> Outcome,
{
    pacer.wait();
    let mut outcome = submit();
    let mut retry = 0;
    while outcome.is_retryable() && retry + 1 < policy.attempts {
        let delay = policy.delay_for(retry);
        tracing::warn!(
            next_attempt = retry + 2,
            delay_ms = delay.as_millis() as u64,
            "retrying after retryable failure"
        );
        thread::sleep(delay);
        outcome = submit();
        retry += 1;
    }
    outcome
}

/// Submit `records` in order through `submit` and tally every outcome.
/// `submit` is a closure so tests can stand in for the network; per-record
/// failures are counted, not propagated, which is what lets a 150-record
/// batch finish with three rejects instead of dying at the first one.
pub fn run_batch<F>(label: &str, records: &[JsonMap], opts: &BatchOptions, mut submit: F) -> Tally
where
    F: FnMut(&JsonMap) -> Outcome,
{
    let mut tally = Tally::new(label);
    let bar = if opts.show_progress {
        ui::batch_bar(records.len() as u64, label)
    } else {
        ProgressBar::hidden()
    };
    let mut pacer = Pacer::new(opts.pace);

    for (i, record) in records.iter().enumerate() {
        let outcome = submit_with_retry(&mut pacer, &opts.retry, || submit(record));
        if outcome.is_success() {
            tally.record_success();
        } else {
            let reference = record
                .get("externalReferenceCode")
                .and_then(Value::as_str)
                .map(str::to_string);
            let detail = outcome.describe();
            let kept = tally.record_failure(i + 1, reference.clone(), detail.clone());
            if kept {
                let who = reference.unwrap_or_else(|| format!("record {}", i + 1));
                bar.println(format!("  {} {}: {}", "FAIL".red(), who, detail));
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    tally
}

/// What an `upload` invocation is going to touch.
#[derive(Debug, Clone)]
pub struct UploadPlan {
    pub datasets: Vec<Dataset>,
    pub data_dir: PathBuf,
    /// Upload at most this many records per dataset.
    pub limit: Option<usize>,
}

/// Load and shape every dataset in the plan. Runs to completion before
/// the first POST, so a malformed file aborts the run while the instance
/// is still untouched.
fn prepare_batches(plan: &UploadPlan) -> Result<Vec<(Dataset, Vec<JsonMap>)>> {
    let mut batches = Vec::with_capacity(plan.datasets.len());
    for dataset in &plan.datasets {
        let path = plan.data_dir.join(dataset.file_name());
        let records = catalog::load_records(&path)?;
        let mut prepared = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            prepared.push(
                catalog::prepare(*dataset, record)
                    .with_context(|| format!("{} record {}", dataset.key(), i + 1))?,
            );
        }
        if let Some(limit) = plan.limit {
            prepared.truncate(limit);
        }
        batches.push((*dataset, prepared));
    }
    Ok(batches)
}

/// Load and transform only. Nothing is sent, so this needs neither
/// credentials nor a reachable instance; every prepared record counts as
/// a success.
pub fn run_dry(plan: &UploadPlan) -> Result<RunReport> {
    let batches = prepare_batches(plan)?;
    let mut report = RunReport::new();
    for (dataset, prepared) in &batches {
        println!(
            "{} {}: {} records ready for {}",
            "DRY".cyan().bold(),
            dataset.key(),
            prepared.len(),
            dataset.endpoint()
        );
        let mut tally = Tally::new(dataset.key());
        for _ in prepared {
            tally.record_success();
        }
        report.push(tally);
    }
    Ok(report)
}

/// Prepare and upload every dataset in the plan.
pub fn run_upload(api: &ApiClient, plan: &UploadPlan, opts: &BatchOptions) -> Result<RunReport> {
    let batches = prepare_batches(plan)?;
    let mut report = RunReport::new();
    for (dataset, prepared) in &batches {
        println!(
            "Uploading {} {} records to {}",
            prepared.len(),
            dataset.key(),
            dataset.endpoint()
        );
        let tally = run_batch(dataset.key(), prepared, opts, |record| {
            api.post_json(dataset.endpoint(), record)
        });
        tally.print();
        report.push(tally);
    }
    Ok(report)
}
