//! Extension traits for the two external collaborators.
//!
//! The pipeline never talks to GitHub or a model API directly. It goes
//! through [`RepoSource`] for listing and downloading files and through
//! [`CompletionProvider`] for text generation. The built-in
//! implementations live in [`connector_github`](crate::connector_github)
//! and [`providers`](crate::providers); tests plug in in-memory fakes.
//!
//! ```text
//! ┌──────────────┐      ┌──────────────────┐
//! │  RepoSource  │      │ CompletionClient │
//! │   (GitHub)   │      │ file │ project   │
//! └──────┬───────┘      │   fallback       │
//!        │              └────────┬─────────┘
//!        ▼                       ▼
//!   TreeFetcher ──▶ FileSummarizer ──▶ ProjectAggregator
//! ```

use async_trait::async_trait;

use crate::error::{FetchError, ProviderError};
use crate::models::{RepositoryRef, TreeEntry};

// ═══════════════════════════════════════════════════════════════════════
// RepoSource Trait
// ═══════════════════════════════════════════════════════════════════════

/// Result of listing a repository path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// The path names a single file.
    File(TreeEntry),
    /// The path names a directory; entries are in listing order.
    Directory(Vec<TreeEntry>),
}

/// Lists and downloads files of a remote repository.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use repo_analyzer::error::FetchError;
/// use repo_analyzer::models::RepositoryRef;
/// use repo_analyzer::traits::{Listing, RepoSource};
///
/// struct EmptyRepo;
///
/// #[async_trait]
/// impl RepoSource for EmptyRepo {
///     async fn list(&self, _repo: &RepositoryRef, _path: &str) -> Result<Listing, FetchError> {
///         Ok(Listing::Directory(vec![]))
///     }
///
///     async fn fetch(&self, content_ref: &str) -> Result<String, FetchError> {
///         Err(FetchError::Transport {
///             path: content_ref.to_string(),
///             message: "no content".to_string(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// List `path` (`""` is the repository root).
    async fn list(&self, repo: &RepositoryRef, path: &str) -> Result<Listing, FetchError>;

    /// Download the raw text behind a [`TreeEntry::content_ref`].
    async fn fetch(&self, content_ref: &str) -> Result<String, FetchError>;
}

// ═══════════════════════════════════════════════════════════════════════
// CompletionProvider Trait
// ═══════════════════════════════════════════════════════════════════════

/// A text-generation backend bound to one model.
///
/// Implementations classify their own failures: a quota or rate-limit
/// response must come back with [`ProviderError::rate_limited`] set.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Model identifier, used in logs.
    fn model_name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}
