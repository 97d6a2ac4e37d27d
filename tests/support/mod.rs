//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use repo_analyzer::completion::CompletionClient;
use repo_analyzer::config::Config;
use repo_analyzer::error::{FetchError, ProviderError};
use repo_analyzer::models::{EntryKind, RepositoryRef, TreeEntry};
use repo_analyzer::pipeline::{Analyzer, PipelineSettings};
use repo_analyzer::report::ReportWriter;
use repo_analyzer::traits::{CompletionProvider, Listing, RepoSource};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ─── Repository ─────────────────────────────────────────────────────

pub fn file(path: &str) -> TreeEntry {
    TreeEntry {
        path: path.to_string(),
        kind: EntryKind::File,
        content_ref: format!("raw://{}", path),
    }
}

pub fn dir(path: &str) -> TreeEntry {
    TreeEntry {
        path: path.to_string(),
        kind: EntryKind::Directory,
        content_ref: String::new(),
    }
}

/// A repository held in memory. Directories map to listings, files to content.
#[derive(Default)]
pub struct FakeRepo {
    listings: HashMap<String, Vec<TreeEntry>>,
    contents: HashMap<String, String>,
    failing: Vec<String>,
    delays: HashMap<String, Duration>,
    fetches: Mutex<HashMap<String, usize>>,
    pub list_calls: AtomicUsize,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listing(mut self, path: &str, entries: Vec<TreeEntry>) -> Self {
        self.listings.insert(path.to_string(), entries);
        self
    }

    pub fn content(mut self, path: &str, text: &str) -> Self {
        self.contents.insert(format!("raw://{}", path), text.to_string());
        self
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.failing.push(format!("raw://{}", path));
        self
    }

    pub fn delay(mut self, path: &str, millis: u64) -> Self {
        self.delays
            .insert(format!("raw://{}", path), Duration::from_millis(millis));
        self
    }

    pub fn fetch_count(&self, path: &str) -> usize {
        self.fetches
            .lock()
            .unwrap()
            .get(&format!("raw://{}", path))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl RepoSource for FakeRepo {
    async fn list(&self, _repo: &RepositoryRef, path: &str) -> Result<Listing, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.listings
            .get(path)
            .cloned()
            .map(Listing::Directory)
            .ok_or_else(|| FetchError::Status {
                path: path.to_string(),
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    async fn fetch(&self, content_ref: &str) -> Result<String, FetchError> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(content_ref.to_string())
            .or_insert(0) += 1;

        if let Some(delay) = self.delays.get(content_ref) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.iter().any(|f| f == content_ref) {
            return Err(FetchError::Transport {
                path: content_ref.to_string(),
                message: "connection reset".to_string(),
            });
        }
        self.contents
            .get(content_ref)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                path: content_ref.to_string(),
                status: 404,
                message: "missing".to_string(),
            })
    }
}

// ─── Providers ──────────────────────────────────────────────────────

/// Answers file prompts with `summary of {path} (chunk i/n)` and records every prompt.
#[derive(Default)]
pub struct EchoFileModel {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionProvider for EchoFileModel {
    fn model_name(&self) -> &str {
        "echo-file"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let line = prompt
            .lines()
            .find(|l| l.starts_with("File: "))
            .unwrap_or("File: ?");
        Ok(format!("summary of {}", &line["File: ".len()..]))
    }
}

/// Records project prompts and answers `section {n}`.
#[derive(Default)]
pub struct RecordingProjectModel {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl CompletionProvider for RecordingProjectModel {
    fn model_name(&self) -> &str {
        "recording-project"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        Ok(format!("section {}", prompts.len()))
    }
}

/// Always fails with the same message; counts calls.
pub struct FailingModel {
    message: String,
    pub calls: AtomicUsize,
}

impl FailingModel {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionProvider for FailingModel {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::new(self.message.clone()))
    }
}

/// Always answers with the same text; counts calls.
pub struct FixedModel {
    text: String,
    pub calls: AtomicUsize,
}

impl FixedModel {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionProvider for FixedModel {
    fn model_name(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Echoes like [`EchoFileModel`] after a delay and records peak concurrency.
pub struct SlowModel {
    delay: Duration,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl SlowModel {
    pub fn new(millis: u64) -> Self {
        Self {
            delay: Duration::from_millis(millis),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionProvider for SlowModel {
    fn model_name(&self) -> &str {
        "slow"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok("slow summary".to_string())
    }
}

// ─── Analyzer ───────────────────────────────────────────────────────

pub fn test_settings() -> PipelineSettings {
    let mut settings = PipelineSettings::from_config(&Config::default()).unwrap();
    settings.pacing = Duration::ZERO;
    settings
}

pub fn analyzer(
    repo: Arc<FakeRepo>,
    client: CompletionClient,
    report_dir: &Path,
) -> Analyzer {
    Analyzer::new(
        repo,
        Arc::new(client),
        test_settings(),
        ReportWriter::new(report_dir),
    )
}

/// `count` one-line Python files, `f0.py` .. `f{count-1}.py`.
pub fn flat_repo(count: usize) -> FakeRepo {
    let names: Vec<String> = (0..count).map(|i| format!("f{}.py", i)).collect();
    let mut repo = FakeRepo::new().listing("", names.iter().map(|n| file(n)).collect());
    for name in &names {
        repo = repo.content(name, "x = 1");
    }
    repo
}

/// `a.py` (300 chars), `b.md` (9000 chars), `logo.png`.
pub fn small_repo() -> FakeRepo {
    FakeRepo::new()
        .listing("", vec![file("a.py"), file("b.md"), file("logo.png")])
        .content("a.py", &"x = 1\n".repeat(50))
        .content("b.md", &"abcdefgh ".repeat(1000))
        .content("logo.png", "\u{89}PNG")
}
