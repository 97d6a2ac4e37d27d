//! Project-level aggregation.
//!
//! File summaries are cut into contiguous batches of `batch_size` in input
//! order; batch `i` covers `[i * B, min((i + 1) * B, n))`. Each batch becomes
//! one project-profile call and one report section.

use chrono::Utc;
use tracing::info;

use crate::completion::{CompletionClient, Profile};
use crate::models::{FileSummary, ProjectReport};

pub struct ProjectAggregator<'a> {
    client: &'a CompletionClient,
    batch_size: usize,
}

impl<'a> ProjectAggregator<'a> {
    pub fn new(client: &'a CompletionClient, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn aggregate(&self, project: &str, summaries: &[FileSummary]) -> ProjectReport {
        let generated_at = Utc::now();
        let batches: Vec<&[FileSummary]> = summaries.chunks(self.batch_size).collect();
        info!(
            "Aggregating {} file summaries in {} batch(es)",
            summaries.len(),
            batches.len()
        );

        let mut sections = Vec::with_capacity(batches.len());
        for batch in batches {
            let joined = batch
                .iter()
                .map(FileSummary::render)
                .collect::<Vec<_>>()
                .join("\n\n");
            let prompt = project_prompt(&joined);
            let text = self.client.complete(Profile::Project, &prompt).await;
            sections.push(text.trim().to_string());
        }

        ProjectReport {
            project: project.to_string(),
            generated_at,
            sections,
        }
    }
}

/// Structured-report prompt embedding one batch of file summaries.
pub fn project_prompt(joined_summaries: &str) -> String {
    format!(
        "You are an expert software architect analyzing a GitHub repository.
Here are summaries of several files:

{joined_summaries}

Please produce a detailed, structured project-level summary including:
1. High-level architecture and main modules
2. Module/folder structure
3. Relationships between classes/functions
4. Design patterns
5. Technologies, frameworks, libraries used
6. Suggested diagrams (UML class/sequence style)
7. Any notable logic or dependencies

Format output in Markdown with headings, bullet points, and code blocks where appropriate.
"
    )
}
