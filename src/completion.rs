//! Completion client with a single fallback hop.
//!
//! Holds the two primary profiles and an optional fallback provider. The
//! client never returns an error: failures come back as readable text so
//! every caller can keep going.
//!
//! # Fallback Policy
//!
//! | Primary result | Action |
//! |----------------|--------|
//! | success | return the text |
//! | `rate_limited` failure | retry once on the fallback, return its text or `"Fallback error: ..."` |
//! | any other failure | return `"Error from {profile} model: ..."`, no retry |

use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::traits::CompletionProvider;

/// Which primary profile a prompt is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    File,
    Project,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::File => f.write_str("file"),
            Profile::Project => f.write_str("project"),
        }
    }
}

/// Shared, read-only entry point to all completion providers.
#[derive(Clone)]
pub struct CompletionClient {
    file: Arc<dyn CompletionProvider>,
    project: Arc<dyn CompletionProvider>,
    fallback: Option<Arc<dyn CompletionProvider>>,
}

impl CompletionClient {
    pub fn new(
        file: Arc<dyn CompletionProvider>,
        project: Arc<dyn CompletionProvider>,
        fallback: Option<Arc<dyn CompletionProvider>>,
    ) -> Self {
        Self {
            file,
            project,
            fallback,
        }
    }

    fn primary(&self, profile: Profile) -> &dyn CompletionProvider {
        match profile {
            Profile::File => self.file.as_ref(),
            Profile::Project => self.project.as_ref(),
        }
    }

    /// Complete `prompt` with the given profile, falling back on rate limits.
    pub async fn complete(&self, profile: Profile, prompt: &str) -> String {
        let primary = self.primary(profile);
        let err = match primary.generate(prompt).await {
            Ok(text) => return text,
            Err(e) => e,
        };

        if !err.rate_limited {
            warn!("{} model {} failed: {}", profile, primary.model_name(), err);
            return format!("Error from {} model: {}", profile, err);
        }

        let Some(fallback) = &self.fallback else {
            warn!(
                "{} model {} rate limited and no fallback is configured",
                profile,
                primary.model_name()
            );
            return format!(
                "Error from {} model: {} (no fallback provider configured)",
                profile, err
            );
        };

        warn!(
            "{} model {} rate limited, falling back to {}",
            profile,
            primary.model_name(),
            fallback.model_name()
        );
        match fallback.generate(prompt).await {
            Ok(text) => text,
            Err(e) => format!("Fallback error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        result: Result<String, ProviderError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(name: &'static str, text: &str) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn err(name: &'static str, message: &str) -> Arc<Self> {
            Arc::new(Self {
                name,
                result: Err(ProviderError::new(message)),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionProvider for Scripted {
        fn model_name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let file = Scripted::ok("file", "file text");
        let project = Scripted::ok("project", "project text");
        let fallback = Scripted::ok("fallback", "fallback text");
        let client = CompletionClient::new(file.clone(), project.clone(), Some(fallback.clone()));

        assert_eq!(client.complete(Profile::File, "p").await, "file text");
        assert_eq!(client.complete(Profile::Project, "p").await, "project text");
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn quota_failure_uses_fallback_once() {
        let file = Scripted::err("file", "429 rate limited");
        let project = Scripted::err("project", "Quota exceeded for metric");
        let fallback = Scripted::ok("fallback", "fallback text");
        let client = CompletionClient::new(file.clone(), project, Some(fallback.clone()));

        assert_eq!(client.complete(Profile::File, "p").await, "fallback text");
        assert_eq!(client.complete(Profile::Project, "p").await, "fallback text");
        assert_eq!(file.calls(), 1);
        assert_eq!(fallback.calls(), 2);
    }

    #[tokio::test]
    async fn other_failure_is_inline_without_fallback() {
        let file = Scripted::err("file", "permission denied");
        let fallback = Scripted::ok("fallback", "fallback text");
        let client = CompletionClient::new(
            file,
            Scripted::ok("project", "x"),
            Some(fallback.clone()),
        );

        let text = client.complete(Profile::File, "p").await;
        assert_eq!(text, "Error from file model: permission denied");
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn fallback_failure_is_wrapped() {
        let client = CompletionClient::new(
            Scripted::err("file", "429"),
            Scripted::ok("project", "x"),
            Some(Scripted::err("fallback", "invalid api key")),
        );
        assert_eq!(
            client.complete(Profile::File, "p").await,
            "Fallback error: invalid api key"
        );
    }

    #[tokio::test]
    async fn rate_limit_without_fallback_is_inline() {
        let client = CompletionClient::new(
            Scripted::err("file", "quota"),
            Scripted::ok("project", "x"),
            None,
        );
        let text = client.complete(Profile::File, "p").await;
        assert!(text.starts_with("Error from file model: quota"));
        assert!(text.contains("no fallback"));
    }
}
