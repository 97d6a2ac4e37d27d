//! Core data models used throughout the analyzer.
//!
//! These types represent the repository entries, file contents, chunks,
//! summaries, and reports that flow through the fetch-and-summarize pipeline.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Identifies a remote repository as `{owner}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Repository-relative path.
    pub path: String,
    pub kind: EntryKind,
    /// Opaque locator for the raw bytes (a download URL for GitHub).
    pub content_ref: String,
}

impl TreeEntry {
    /// Final path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A discovered, non-binary file. `content` is `None` only if the download failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub content: Option<String>,
}

/// All files of one repository keyed by path, in traversal order.
pub type FileCollection = IndexMap<String, FileRecord>;

/// A bounded slice of one file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Summary of one file: per-chunk summaries joined by a blank line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub path: String,
    pub summary: String,
}

impl FileSummary {
    /// Form used inside a project-level prompt.
    pub fn render(&self) -> String {
        format!("{}:\n{}", self.path, self.summary)
    }
}

/// Aggregated report: one section per batch of file summaries.
#[derive(Debug, Clone)]
pub struct ProjectReport {
    pub project: String,
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<String>,
}

impl ProjectReport {
    /// Header followed by all sections, separated by blank lines.
    pub fn render(&self) -> String {
        let mut out = format!(
            "# {} - Comprehensive Summary\n\nGenerated on {}\n\n",
            self.project,
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        for section in &self.sections {
            out.push_str(section.trim());
            out.push_str("\n\n");
        }
        out
    }
}

/// Result of a blocking analysis run, as returned by `GET /analyze_repo`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub repo: String,
    pub file_count: usize,
    pub project_summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn report_renders_header_and_sections_in_order() {
        let report = ProjectReport {
            project: "octo/demo".to_string(),
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            sections: vec!["first\n".to_string(), "second".to_string()],
        };
        assert_eq!(
            report.render(),
            "# octo/demo - Comprehensive Summary\n\nGenerated on 2024-05-01 12:30:00\n\nfirst\n\nsecond\n\n"
        );
    }

    #[test]
    fn entry_name_is_last_component() {
        let entry = TreeEntry {
            path: "src/utils/io.rs".to_string(),
            kind: EntryKind::File,
            content_ref: String::new(),
        };
        assert_eq!(entry.name(), "io.rs");
        assert_eq!(RepositoryRef::new("a", "b").to_string(), "a/b");
    }
}
