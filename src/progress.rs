//! Pipeline progress events and where they go.
//!
//! A run moves through `VALIDATING → FETCHING → SUMMARIZING(k of n) →
//! AGGREGATING → DONE`, with `ERROR` reachable from any stage. Each
//! transition and each per-file result is a [`PipelineEvent`] handed to a
//! [`ProgressSink`]:
//!
//! - [`SilentSink`] — blocking mode; events are only logged and files are
//!   summarized concurrently.
//! - [`ChannelSink`] — streaming mode; events go to an mpsc channel in order
//!   and files are summarized one at a time.
//!
//! For the CLI, [`ProgressMode`] picks a [`ProgressReporter`] that prints
//! streamed events on **stderr** so stdout stays parseable for scripts.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::debug;

/// Stage of a run; its `Display` form is the `status` text.
///
/// Validation has no event of its own: a valid URL is announced with
/// [`Stage::Accepted`], an invalid one goes straight to an `error` event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Stage {
    Accepted { repo: String },
    Fetching,
    Summarizing { path: String, k: usize, n: usize },
    Aggregating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Accepted { repo } => write!(f, "Repository accepted: {}", repo),
            Stage::Fetching => f.write_str("Fetching files"),
            Stage::Summarizing { path, k, n } => write!(f, "Summarizing {} ({}/{})", path, k, n),
            Stage::Aggregating => f.write_str("Generating project summary"),
            Stage::Done => f.write_str("Completed"),
        }
    }
}

/// One progress event. Serializes as a JSON object with exactly one key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEvent {
    Status(String),
    Skip { path: String, reason: String },
    FileSummary { path: String, summary: String },
    ProjectSummaryFile(String),
    Error(String),
}

impl PipelineEvent {
    pub fn status(stage: &Stage) -> Self {
        PipelineEvent::Status(stage.to_string())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("failed to encode event: {}", e) }).to_string()
        })
    }
}

/// The consumer of a stream went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// Destination for the events of one run.
#[async_trait]
pub trait ProgressSink: Send {
    /// Whether events are delivered as they happen. Incremental sinks get
    /// files summarized one at a time in traversal order.
    fn is_incremental(&self) -> bool;

    async fn emit(&mut self, event: PipelineEvent) -> Result<(), SinkClosed>;
}

/// Blocking-mode sink: events are logged at debug and dropped.
#[derive(Debug, Default)]
pub struct SilentSink;

#[async_trait]
impl ProgressSink for SilentSink {
    fn is_incremental(&self) -> bool {
        false
    }

    async fn emit(&mut self, event: PipelineEvent) -> Result<(), SinkClosed> {
        if let PipelineEvent::Status(status) = &event {
            debug!("{}", status);
        }
        Ok(())
    }
}

/// Streaming-mode sink feeding an mpsc channel.
pub struct ChannelSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    fn is_incremental(&self) -> bool {
        true
    }

    async fn emit(&mut self, event: PipelineEvent) -> Result<(), SinkClosed> {
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }
}

// ============ CLI reporters ============

/// Prints streamed events for the CLI.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: &PipelineEvent);
}

/// Human-friendly lines on stderr: "status  Summarizing src/main.rs (3/12)".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, event: &PipelineEvent) {
        let line = match event {
            PipelineEvent::Status(status) => format!("status   {}\n", status),
            PipelineEvent::Skip { path, reason } => format!("skip     {} ({})\n", path, reason),
            PipelineEvent::FileSummary { path, summary } => {
                format!("summary  {} ({} chars)\n", path, summary.chars().count())
            }
            PipelineEvent::ProjectSummaryFile(file) => format!("report   {}\n", file),
            PipelineEvent::Error(message) => format!("error    {}\n", message),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON event per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, event: &PipelineEvent) {
        let _ = writeln!(std::io::stderr().lock(), "{}", event.to_json());
        let _ = std::io::stderr().lock().flush();
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: &PipelineEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise JSON lines.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Json
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_one_key() {
        let cases = [
            (PipelineEvent::Status("Completed".into()), "status"),
            (
                PipelineEvent::Skip {
                    path: "logo.png".into(),
                    reason: "unsupported extension".into(),
                },
                "skip",
            ),
            (
                PipelineEvent::FileSummary {
                    path: "a.py".into(),
                    summary: "text".into(),
                },
                "file_summary",
            ),
            (
                PipelineEvent::ProjectSummaryFile("reports/a_b_summary.md".into()),
                "project_summary_file",
            ),
            (PipelineEvent::Error("boom".into()), "error"),
        ];
        for (event, key) in cases {
            let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
            let obj = value.as_object().unwrap();
            assert_eq!(obj.len(), 1);
            assert!(obj.contains_key(key), "missing {} in {}", key, value);
        }
    }

    #[test]
    fn stage_status_text() {
        let stage = Stage::Summarizing {
            path: "src/a.rs".into(),
            k: 2,
            n: 7,
        };
        assert_eq!(stage.to_string(), "Summarizing src/a.rs (2/7)");
        assert_eq!(
            PipelineEvent::status(&Stage::Done),
            PipelineEvent::Status("Completed".into())
        );
    }

    #[tokio::test]
    async fn channel_sink_reports_closed_receiver() {
        let (tx, rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx);
        assert!(sink.emit(PipelineEvent::Status("x".into())).await.is_ok());
        drop(rx);
        assert_eq!(
            sink.emit(PipelineEvent::Status("y".into())).await,
            Err(SinkClosed)
        );
    }
}
