//! file: cli/src/output.rs
//! description: progress, lambda log lines and summary rendering for `lcm`.

use std::path::Path;

use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};
use lcm_core::{Error, ErrorCode, LambdaSpec, LogSink, OwnedBatch, Result};
use serde::Serialize;

/// ====================================================================
/// Reports

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub batch_id: i32,
    pub input: String,
    pub status: String,
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Set when the result was written to a file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Result payload, lossily decoded. Only filled for `--json` without `--output`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl BatchReport {
    pub fn new(batch_id: i32, input: &Path, result: &Result<OwnedBatch>) -> Self {
        let (code, detail) = outcome(result.as_ref().err());
        BatchReport {
            batch_id,
            input: input.display().to_string(),
            status: format!("{:?}", code),
            code: code.as_raw(),
            message: code.as_str().to_string(),
            detail,
            output: None,
            payload: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub lambda_id: i32,
    pub lambda: String,
    pub batches: Vec<BatchReport>,
}

#[derive(Debug, Serialize)]
pub struct LambdaReport {
    pub id: i32,
    pub path: String,
    pub description: String,
    pub status: String,
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl LambdaReport {
    pub fn new(spec: &LambdaSpec, code: ErrorCode, err: Option<&Error>) -> Self {
        LambdaReport {
            id: spec.id,
            path: spec.path.clone(),
            description: spec.description.clone(),
            status: format!("{:?}", code),
            code: code.as_raw(),
            message: code.as_str().to_string(),
            detail: err.and_then(|e| e.detail()).map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub manifest: String,
    pub name: String,
    pub lambdas: Vec<LambdaReport>,
}

fn outcome(err: Option<&Error>) -> (ErrorCode, Option<String>) {
    match err {
        Some(e) => (e.code(), e.detail().map(str::to_string)),
        None => (ErrorCode::Ok, None),
    }
}

/// ====================================================================
/// Tables

pub fn render_run_table(report: &RunReport) -> String {
    let mut table = new_table(vec!["Batch", "Input", "Status", "Detail"]);
    for batch in &report.batches {
        table.add_row(vec![
            Cell::new(batch.batch_id),
            Cell::new(&batch.input),
            status_cell(&batch.status, batch.code),
            Cell::new(batch.detail.as_deref().or(batch.output.as_deref()).unwrap_or("")),
        ]);
    }
    let failed = report.batches.iter().filter(|b| b.code != 0).count();
    format!(
        "{}\n{}",
        table,
        summary_line(
            &format!("lambda {} ({})", report.lambda_id, report.lambda),
            report.batches.len(),
            failed
        )
    )
}

pub fn render_check_table(report: &CheckReport) -> String {
    let mut table = new_table(vec!["Id", "Path", "Description", "Status", "Detail"]);
    for lambda in &report.lambdas {
        table.add_row(vec![
            Cell::new(lambda.id),
            Cell::new(&lambda.path),
            Cell::new(&lambda.description),
            status_cell(&lambda.status, lambda.code),
            Cell::new(lambda.detail.as_deref().unwrap_or("")),
        ]);
    }
    let failed = report.lambdas.iter().filter(|l| l.code != 0).count();
    let title = if report.name.is_empty() { report.manifest.clone() } else { report.name.clone() };
    format!("{}\n{}", table, summary_line(&title, report.lambdas.len(), failed))
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn status_cell(status: &str, code: i32) -> Cell {
    let color = if code == 0 { Color::Green } else { Color::Red };
    Cell::new(status).fg(color)
}

fn summary_line(title: &str, total: usize, failed: usize) -> String {
    let title = Style::new().bold().for_stderr().apply_to(title);
    if failed == 0 {
        format!("{}: {} ok", title, Style::new().green().for_stderr().apply_to(total))
    } else {
        format!(
            "{}: {} ok, {}",
            title,
            total - failed,
            Style::new().red().bold().for_stderr().apply_to(format!("{} failed", failed))
        )
    }
}

/// ====================================================================
/// Progress and lambda logs

/// Progress over `len` batches. Hidden unless `visible`, since results
/// may be streaming to stdout.
pub fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible || len == 0 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {wide_msg}") {
        pb.set_style(style.progress_chars("█▒░"));
    }
    pb
}

/// Prints `lcm:log` messages to stderr, tagged with their lambda and batch.
pub fn lambda_log_sink(progress: ProgressBar) -> LogSink {
    let tag = Style::new().cyan().dim().for_stderr();
    LogSink::new(move |entry| {
        let line = format!(
            "{} {}",
            tag.apply_to(format!("[lambda {} batch {}]", entry.lambda_id, entry.batch_id)),
            entry.message_lossy()
        );
        progress.suspend(|| eprintln!("{}", line));
    })
}
