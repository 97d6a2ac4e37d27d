//! Markdown report persistence.

use std::path::PathBuf;
use tracing::info;

use crate::error::AggregationError;
use crate::models::{ProjectReport, RepositoryRef};

/// Writes rendered reports as `{owner}_{name}_summary.md` under one directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, repo: &RepositoryRef) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}_summary.md", repo.owner, repo.name))
    }

    /// Write `report` and return the file path.
    pub async fn write(
        &self,
        repo: &RepositoryRef,
        report: &ProjectReport,
    ) -> Result<PathBuf, AggregationError> {
        let path = self.path_for(repo);
        let persist_err = |source: std::io::Error| AggregationError::Persist {
            path: path.display().to_string(),
            source,
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(persist_err)?;
        tokio::fs::write(&path, report.render())
            .await
            .map_err(persist_err)?;

        info!("Report for {} written to {}", repo, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn writes_rendered_report() {
        let tmp = tempfile::TempDir::new().unwrap();
        let writer = ReportWriter::new(tmp.path().join("out"));
        let repo = RepositoryRef::new("octo", "demo");
        let report = ProjectReport {
            project: repo.to_string(),
            generated_at: Utc::now(),
            sections: vec!["## Architecture".to_string()],
        };

        let path = writer.write(&repo, &report).await.unwrap();
        assert!(path.ends_with("octo_demo_summary.md"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# octo/demo - Comprehensive Summary"));
        assert!(text.contains("## Architecture"));
    }

    #[tokio::test]
    async fn unwritable_directory_is_aggregation_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let writer = ReportWriter::new(blocker.join("nested"));
        let repo = RepositoryRef::new("octo", "demo");
        let report = ProjectReport {
            project: repo.to_string(),
            generated_at: Utc::now(),
            sections: vec![],
        };

        let err = writer.write(&repo, &report).await.unwrap_err();
        assert!(matches!(err, AggregationError::Persist { .. }));
    }
}
