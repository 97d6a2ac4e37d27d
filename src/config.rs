//! TOML configuration.
//!
//! Every section is optional; missing keys fall back to the defaults below.
//! Secrets never live in the file: `GITHUB_TOKEN`, `GEMINI_API_KEY` and
//! `OPENAI_API_KEY` are read from the environment, and `AI_MODEL_FILE` /
//! `AI_MODEL_PROJECT` override the two completion profile names.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    /// Files with these extensions are never downloaded.
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            excluded_extensions: default_excluded_extensions(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_excluded_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif", "ico", "exe", "dll", "zip", "tar"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_file_model")]
    pub file_model: String,
    #[serde(default = "default_project_model")]
    pub project_model: String,
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    #[serde(default = "default_fallback_api_url")]
    pub fallback_api_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            file_model: default_file_model(),
            project_model: default_project_model(),
            gemini_api_url: default_gemini_api_url(),
            fallback_model: default_fallback_model(),
            fallback_api_url: default_fallback_api_url(),
            temperature: default_temperature(),
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

fn default_file_model() -> String {
    "models/gemini-2.5-flash".to_string()
}
fn default_project_model() -> String {
    "models/gemini-pro-latest".to_string()
}
fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_fallback_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_fallback_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_completion_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Maximum characters per chunk sent to the file profile.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// File summaries per project-level aggregation call.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Delay between consecutive file events in streaming mode.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    /// Extensions eligible for summarization.
    #[serde(default = "default_summarize_extensions")]
    pub summarize_extensions: Vec<String>,
    /// Extensionless file names eligible for summarization.
    #[serde(default = "default_summarize_file_names")]
    pub summarize_file_names: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            batch_size: default_batch_size(),
            pacing_ms: default_pacing_ms(),
            summarize_extensions: default_summarize_extensions(),
            summarize_file_names: default_summarize_file_names(),
        }
    }
}

fn default_chunk_size() -> usize {
    4000
}
fn default_batch_size() -> usize {
    5
}
fn default_pacing_ms() -> u64 {
    100
}
fn default_summarize_file_names() -> Vec<String> {
    vec!["Dockerfile".to_string(), "Makefile".to_string()]
}
fn default_summarize_extensions() -> Vec<String> {
    [
        "py", "js", "jsx", "ts", "tsx", "java", "kt", "go", "rs", "rb", "php", "c", "h", "cpp",
        "hpp", "cs", "swift", "scala", "sh", "sql", "html", "css", "scss", "vue", "md", "txt",
        "rst", "json", "yaml", "yml", "toml", "ini", "cfg", "xml", "gradle",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Config {
    /// Apply `AI_MODEL_FILE` / `AI_MODEL_PROJECT` if set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("AI_MODEL_FILE") {
            if !model.trim().is_empty() {
                self.completion.file_model = model;
            }
        }
        if let Ok(model) = std::env::var("AI_MODEL_PROJECT") {
            if !model.trim().is_empty() {
                self.completion.project_model = model;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.chunk_size == 0 {
            anyhow::bail!("pipeline.chunk_size must be > 0");
        }
        if self.pipeline.batch_size == 0 {
            anyhow::bail!("pipeline.batch_size must be > 0");
        }
        if self.server.bind.trim().is_empty() {
            anyhow::bail!("server.bind must not be empty");
        }
        for (key, value) in [
            ("completion.file_model", &self.completion.file_model),
            ("completion.project_model", &self.completion.project_model),
            ("completion.fallback_model", &self.completion.fallback_model),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{} must not be empty", key);
            }
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Load the config file, or the defaults when `path` does not exist.
/// Environment overrides are applied in both cases.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        Config::default()
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
