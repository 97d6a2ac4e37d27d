//! Pipeline orchestration.
//!
//! One staged run, `validate → fetch → summarize → aggregate → done`, shared
//! by both operating modes. The [`ProgressSink`] decides how the run is
//! observed:
//!
//! - blocking ([`Analyzer::analyze`]) — files are summarized concurrently and
//!   the caller gets an [`AnalysisResult`] or an [`AnalyzeError`];
//! - streaming ([`Analyzer::analyze_streaming`]) — files are summarized one
//!   at a time in traversal order and every step is emitted as a
//!   [`PipelineEvent`]; failures become `error` events.

use anyhow::Context;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::aggregate::ProjectAggregator;
use crate::completion::CompletionClient;
use crate::config::Config;
use crate::connector_github::GitHubSource;
use crate::error::AnalyzeError;
use crate::fetcher::{ExtensionSet, TreeFetcher};
use crate::models::{AnalysisResult, FileCollection, FileRecord, FileSummary};
use crate::progress::{PipelineEvent, ProgressSink, SilentSink, SinkClosed, Stage};
use crate::providers;
use crate::repo_url::parse_repo_url;
use crate::report::ReportWriter;
use crate::summarize::FileSummarizer;
use crate::traits::RepoSource;

impl From<SinkClosed> for AnalyzeError {
    fn from(_: SinkClosed) -> Self {
        AnalyzeError::Disconnected
    }
}

/// Tunables of one pipeline, resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub chunk_size: usize,
    pub batch_size: usize,
    pub pacing: Duration,
    /// Never downloaded.
    pub excluded: ExtensionSet,
    /// Summarized when content is present.
    pub summarize: ExtensionSet,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            chunk_size: config.pipeline.chunk_size,
            batch_size: config.pipeline.batch_size,
            pacing: Duration::from_millis(config.pipeline.pacing_ms),
            excluded: ExtensionSet::new(&config.github.excluded_extensions, &[])
                .context("invalid github.excluded_extensions")?,
            summarize: ExtensionSet::new(
                &config.pipeline.summarize_extensions,
                &config.pipeline.summarize_file_names,
            )
            .context("invalid pipeline.summarize_extensions")?,
        })
    }
}

/// Runs analyses; cheap to share behind an `Arc` across requests.
pub struct Analyzer {
    source: Arc<dyn RepoSource>,
    client: Arc<CompletionClient>,
    settings: PipelineSettings,
    reports: ReportWriter,
}

impl Analyzer {
    pub fn new(
        source: Arc<dyn RepoSource>,
        client: Arc<CompletionClient>,
        settings: PipelineSettings,
        reports: ReportWriter,
    ) -> Self {
        Self {
            source,
            client,
            settings,
            reports,
        }
    }

    /// Build the production analyzer: GitHub source and configured providers.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source = GitHubSource::from_env(&config.github)?;
        let client = providers::build_client(&config.completion)?;
        Ok(Self::new(
            Arc::new(source),
            Arc::new(client),
            PipelineSettings::from_config(config)?,
            ReportWriter::new(&config.report.output_dir),
        ))
    }

    /// Blocking mode: run to completion and return the final result.
    pub async fn analyze(&self, url: &str) -> Result<AnalysisResult, AnalyzeError> {
        self.run(url, &mut SilentSink).await
    }

    /// Streaming mode: every step goes to `sink`; failures become `error` events.
    ///
    /// Stops as soon as the sink reports its consumer is gone.
    pub async fn analyze_streaming(&self, url: &str, sink: &mut dyn ProgressSink) {
        let err = match self.run(url, sink).await {
            Ok(_) => return,
            Err(AnalyzeError::Disconnected) => {
                info!("Stream consumer disconnected; run for {} stopped", url);
                return;
            }
            Err(e) => e,
        };

        warn!("Analysis of {} failed: {}", url, err);
        let continues = matches!(err, AnalyzeError::Aggregation(_));
        if sink.emit(PipelineEvent::Error(err.to_string())).await.is_ok() && continues {
            let _ = sink.emit(PipelineEvent::status(&Stage::Done)).await;
        }
    }

    async fn run(
        &self,
        url: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<AnalysisResult, AnalyzeError> {
        let repo = parse_repo_url(url)?;
        sink.emit(PipelineEvent::status(&Stage::Accepted {
            repo: repo.to_string(),
        }))
        .await?;

        sink.emit(PipelineEvent::status(&Stage::Fetching)).await?;
        let files = TreeFetcher::new(self.source.as_ref(), &self.settings.excluded)
            .fetch(&repo)
            .await?;

        if !files.values().any(|r| self.eligible(r).is_ok()) {
            return Err(AnalyzeError::NoReadableFiles);
        }

        let summaries = if sink.is_incremental() {
            self.summarize_sequential(&files, sink).await?
        } else {
            self.summarize_concurrent(&files, sink).await?
        };

        sink.emit(PipelineEvent::status(&Stage::Aggregating)).await?;
        let report = ProjectAggregator::new(&self.client, self.settings.batch_size)
            .aggregate(&repo.to_string(), &summaries)
            .await;
        let path = self.reports.write(&repo, &report).await?;
        sink.emit(PipelineEvent::ProjectSummaryFile(path.display().to_string()))
            .await?;

        sink.emit(PipelineEvent::status(&Stage::Done)).await?;
        info!(
            "Analysis of {} complete: {} files, {} summarized",
            repo,
            files.len(),
            summaries.len()
        );

        Ok(AnalysisResult {
            repo: repo.to_string(),
            file_count: files.len(),
            project_summary: report.render(),
        })
    }

    /// The content to summarize, or why the file is skipped.
    fn eligible<'r>(&self, record: &'r FileRecord) -> Result<&'r str, &'static str> {
        if !self.settings.summarize.matches(&record.path) {
            return Err("unsupported extension");
        }
        record.content.as_deref().ok_or("content unavailable")
    }

    async fn summarize_sequential(
        &self,
        files: &FileCollection,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<FileSummary>, AnalyzeError> {
        let summarizer = FileSummarizer::new(&self.client, self.settings.chunk_size);
        // k and n count summarized files only
        let n = files
            .values()
            .filter(|r| self.eligible(r).is_ok())
            .count();
        let mut summaries = Vec::new();

        for (i, record) in files.values().enumerate() {
            if i > 0 && !self.settings.pacing.is_zero() {
                tokio::time::sleep(self.settings.pacing).await;
            }

            let content = match self.eligible(record) {
                Ok(content) => content,
                Err(reason) => {
                    sink.emit(skip_event(record, reason)).await?;
                    continue;
                }
            };

            sink.emit(PipelineEvent::status(&Stage::Summarizing {
                path: record.path.clone(),
                k: summaries.len() + 1,
                n,
            }))
            .await?;
            let summary = summarizer.summarize(&record.path, content).await;
            sink.emit(PipelineEvent::FileSummary {
                path: summary.path.clone(),
                summary: summary.summary.clone(),
            })
            .await?;
            summaries.push(summary);
        }

        Ok(summaries)
    }

    async fn summarize_concurrent(
        &self,
        files: &FileCollection,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<FileSummary>, AnalyzeError> {
        let summarizer = FileSummarizer::new(&self.client, self.settings.chunk_size);
        let mut jobs = Vec::new();

        for record in files.values() {
            match self.eligible(record) {
                Ok(content) => jobs.push(summarizer.summarize(&record.path, content)),
                Err(reason) => sink.emit(skip_event(record, reason)).await?,
            }
        }

        // join_all keeps input order, so batches do not depend on completion timing
        let summaries = join_all(jobs).await;
        for summary in &summaries {
            sink.emit(PipelineEvent::FileSummary {
                path: summary.path.clone(),
                summary: summary.summary.clone(),
            })
            .await?;
        }
        Ok(summaries)
    }
}

fn skip_event(record: &FileRecord, reason: &str) -> PipelineEvent {
    PipelineEvent::Skip {
        path: record.path.clone(),
        reason: reason.to_string(),
    }
}
