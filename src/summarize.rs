//! Per-file summarization.
//!
//! A file is split with [`chunk_text`], each chunk is sent to the file
//! profile, and the per-chunk answers are joined in chunk order by a blank
//! line. Inline error text from the completion client stays at its chunk's
//! position.

use tracing::debug;

use crate::chunk::chunk_text;
use crate::completion::{CompletionClient, Profile};
use crate::models::FileSummary;

pub struct FileSummarizer<'a> {
    client: &'a CompletionClient,
    chunk_size: usize,
}

impl<'a> FileSummarizer<'a> {
    pub fn new(client: &'a CompletionClient, chunk_size: usize) -> Self {
        Self { client, chunk_size }
    }

    pub async fn summarize(&self, path: &str, content: &str) -> FileSummary {
        let chunks = chunk_text(content, self.chunk_size);
        let total = chunks.len();
        debug!("Summarizing {} in {} chunk(s)", path, total);

        let mut parts = Vec::with_capacity(total);
        for chunk in &chunks {
            let prompt = file_prompt(path, chunk.index + 1, total, &chunk.text);
            let text = self.client.complete(Profile::File, &prompt).await;
            parts.push(text.trim().to_string());
        }

        FileSummary {
            path: path.to_string(),
            summary: parts.join("\n\n"),
        }
    }
}

/// Analysis prompt for chunk `number` (1-based) of `total`.
pub fn file_prompt(path: &str, number: usize, total: usize, chunk: &str) -> String {
    format!(
        "You are an expert software engineer and architect.
Analyze this code chunk and provide a detailed, structured summary:

File: {path} (chunk {number}/{total})

Instructions:
- Purpose of the code
- Main classes/functions and responsibilities
- Relationships between classes/functions
- Design patterns used
- Notable logic
- Frameworks/libraries used

Content:
{chunk}
"
    )
}
