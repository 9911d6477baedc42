use serde::Deserialize;
use std::time::Duration;

use crate::services::recommendations::PipelineSettings;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB read access token (sent as a bearer token)
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// OpenAI API key
    pub openai_api_key: String,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    /// Chat model used for recommendations
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Hard cap on upcoming-release pages fetched per request
    #[serde(default = "default_catalog_max_pages")]
    pub catalog_max_pages: u32,

    /// Number of recommendations requested from the model
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Below this many results the pipeline is re-run
    #[serde(default = "default_min_recommendations")]
    pub min_recommendations: usize,

    /// Extra pipeline runs allowed when results come back short
    #[serde(default = "default_max_quality_retries")]
    pub max_quality_retries: u32,

    /// Wall-clock bound on a single completion call
    #[serde(default = "default_completion_timeout_secs")]
    pub completion_timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub top_p: Option<f32>,

    #[serde(default)]
    pub frequency_penalty: Option<f32>,

    /// Randomize candidate order before building the prompt
    #[serde(default = "default_shuffle_candidates")]
    pub shuffle_candidates: bool,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_catalog_max_pages() -> u32 {
    8
}

fn default_recommendation_count() -> usize {
    8
}

fn default_min_recommendations() -> usize {
    4
}

fn default_max_quality_retries() -> u32 {
    2
}

fn default_completion_timeout_secs() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_shuffle_candidates() -> bool {
    true
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings consumed by the recommendation pipeline
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_catalog_pages: self.catalog_max_pages,
            recommendation_count: self.recommendation_count,
            min_recommendations: self.min_recommendations,
            max_quality_retries: self.max_quality_retries,
            completion_timeout: Duration::from_secs(self.completion_timeout_secs),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            frequency_penalty: self.frequency_penalty,
            shuffle_candidates: self.shuffle_candidates,
        }
    }
}
