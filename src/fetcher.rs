//! Recursive repository tree fetcher.
//!
//! Walks a repository depth-first through a [`RepoSource`]. Files in one
//! directory download concurrently as a single batch once that directory has
//! been enumerated; subdirectories are walked one at a time as they are met.
//! The returned [`FileCollection`] iterates in discovery order.

use futures::future::{join_all, BoxFuture, FutureExt};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::models::{EntryKind, FileCollection, FileRecord, RepositoryRef, TreeEntry};
use crate::traits::{Listing, RepoSource};

/// Case-insensitive matcher over file names: `*.{ext}` globs plus exact
/// names for extensionless files such as `Dockerfile`.
#[derive(Debug, Clone)]
pub struct ExtensionSet {
    set: GlobSet,
    names: Vec<String>,
}

impl ExtensionSet {
    pub fn new(extensions: &[String], file_names: &[String]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for ext in extensions {
            let ext = ext.trim().trim_start_matches('.');
            if ext.is_empty() {
                continue;
            }
            let glob = GlobBuilder::new(&format!("*.{}", ext))
                .case_insensitive(true)
                .literal_separator(false)
                .build()?;
            builder.add(glob);
        }
        Ok(Self {
            set: builder.build()?,
            names: file_names
                .iter()
                .map(|n| n.trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        })
    }

    /// Match the final component of `path`.
    pub fn matches(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        self.set.is_match(name) || self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Downloads every non-excluded file of a repository.
pub struct TreeFetcher<'a> {
    source: &'a dyn RepoSource,
    excluded: &'a ExtensionSet,
}

impl<'a> TreeFetcher<'a> {
    pub fn new(source: &'a dyn RepoSource, excluded: &'a ExtensionSet) -> Self {
        Self { source, excluded }
    }

    /// Fetch all files of `repo`.
    ///
    /// Fails if the root or any subdirectory cannot be listed. A failed file
    /// download is recorded as `content: None` and does not stop the walk.
    pub async fn fetch(&self, repo: &RepositoryRef) -> Result<FileCollection, FetchError> {
        info!("Fetching files for {}", repo);
        let files = self.walk(repo, String::new()).await?;
        info!("Fetched {} files from {}", files.len(), repo);
        Ok(files)
    }

    fn walk<'s>(
        &'s self,
        repo: &'s RepositoryRef,
        path: String,
    ) -> BoxFuture<'s, Result<FileCollection, FetchError>> {
        async move {
            let entries = match self.source.list(repo, &path).await? {
                Listing::File(entry) => vec![entry],
                Listing::Directory(entries) => entries,
            };

            let mut files = FileCollection::new();
            let mut pending = Vec::new();

            for entry in entries {
                match entry.kind {
                    EntryKind::File => {
                        if self.excluded.matches(entry.name()) {
                            debug!("Skipping binary file {}", entry.path);
                            continue;
                        }
                        files.insert(
                            entry.path.clone(),
                            FileRecord {
                                path: entry.path.clone(),
                                content: None,
                            },
                        );
                        pending.push(entry);
                    }
                    EntryKind::Directory => {
                        let sub = self.walk(repo, entry.path).await?;
                        files.extend(sub);
                    }
                }
            }

            let downloads = pending.iter().map(|entry| self.download(entry));
            let results = join_all(downloads).await;

            for (entry, content) in pending.iter().zip(results) {
                if let Some(record) = files.get_mut(&entry.path) {
                    record.content = content;
                }
            }

            Ok(files)
        }
        .boxed()
    }

    async fn download(&self, entry: &TreeEntry) -> Option<String> {
        match self.source.fetch(&entry.content_ref).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to fetch {}: {}", entry.path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_set_is_case_insensitive() {
        let set = ExtensionSet::new(&["png".to_string(), ".zip".to_string()], &[]).unwrap();
        assert!(set.matches("assets/Logo.PNG"));
        assert!(set.matches("dist/release.zip"));
        assert!(!set.matches("src/png.rs"));
        assert!(!set.matches("zip"));
    }

    #[test]
    fn empty_extension_set_matches_nothing() {
        let set = ExtensionSet::new(&[], &[]).unwrap();
        assert!(!set.matches("a.png"));
    }

    #[test]
    fn file_names_match_whole_name_only() {
        let set = ExtensionSet::new(&["rs".to_string()], &["Dockerfile".to_string()]).unwrap();
        assert!(set.matches("Dockerfile"));
        assert!(set.matches("deploy/dockerfile"));
        assert!(!set.matches("Dockerfile.bak"));
        assert!(!set.matches("my.Dockerfile"));
        assert!(set.matches("src/main.rs"));
    }
}
