//! # Repo Analyzer
//!
//! Fetches every readable text file of a GitHub repository, summarizes each
//! file with a language model, and aggregates the summaries into one
//! project-level Markdown report.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────────┐   ┌──────────────┐
//! │ TreeFetcher │──▶│    Chunker   │──▶│ FileSummarizer │──▶│  Aggregator  │
//! │  (GitHub)   │   │              │   │  (file model)  │   │(project model)│
//! └─────────────┘   └──────────────┘   └────────────────┘   └──────┬───────┘
//!                                                                  │
//!                        ┌─────────────────────────────────────────┤
//!                        ▼                                         ▼
//!                  ┌──────────┐                              ┌──────────┐
//!                  │   CLI    │                              │   HTTP   │
//!                  │ analyze  │                              │ JSON/SSE │
//!                  └──────────┘                              └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...            # primary profiles
//! export OPENAI_API_KEY=...            # optional fallback
//! repo-analyzer analyze https://github.com/owner/project
//! repo-analyzer analyze https://github.com/owner/project --stream
//! repo-analyzer serve                  # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`repo_url`] | Repository URL validation |
//! | [`traits`] | `RepoSource` and `CompletionProvider` seams |
//! | [`connector_github`] | GitHub contents API connector |
//! | [`fetcher`] | Recursive, concurrent tree download |
//! | [`chunk`] | Text chunking |
//! | [`completion`] | Completion client with rate-limit fallback |
//! | [`providers`] | Gemini and OpenAI providers |
//! | [`summarize`] | Per-file summarization |
//! | [`aggregate`] | Batched project report |
//! | [`report`] | Report persistence |
//! | [`progress`] | Progress events, sinks, and CLI reporters |
//! | [`pipeline`] | Blocking and streaming orchestration |
//! | [`server`] | HTTP server |

pub mod aggregate;
pub mod chunk;
pub mod completion;
pub mod config;
pub mod connector_github;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod providers;
pub mod repo_url;
pub mod report;
pub mod server;
pub mod summarize;
pub mod traits;
