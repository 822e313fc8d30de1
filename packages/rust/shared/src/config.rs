//! Application configuration for newsdigest.
//!
//! User config lives at `~/.newsdigest/newsdigest.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{NewsDigestError, Result};
use crate::sources::{SourceSet, builtin_sources};
use crate::types::FeedSource;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "newsdigest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".newsdigest";

// ---------------------------------------------------------------------------
// Config structs (matching newsdigest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// AI backend settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Metadata for the generated feeds and page.
    #[serde(default)]
    pub feed: FeedMetaConfig,

    /// Static file server.
    #[serde(default)]
    pub server: ServerConfig,

    /// Feeds to poll. Empty means the built-in set.
    #[serde(default)]
    pub sources: Vec<FeedSource>,
}

impl AppConfig {
    /// Resolve the feeds to poll for a run.
    ///
    /// An explicit set wins; otherwise configured sources are used, falling
    /// back to the built-in MVP set.
    pub fn resolve_sources(&self, set: Option<SourceSet>) -> Vec<FeedSource> {
        match set {
            Some(SourceSet::Config) | None if !self.sources.is_empty() => self.sources.clone(),
            Some(SourceSet::All) => builtin_sources(SourceSet::All),
            _ => builtin_sources(SourceSet::Mvp),
        }
    }

    /// Check values that serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.defaults.window_hours == 0 {
            return Err(NewsDigestError::config("defaults.window_hours must be > 0"));
        }
        if self.defaults.http_timeout_secs == 0 {
            return Err(NewsDigestError::config(
                "defaults.http_timeout_secs must be > 0",
            ));
        }
        for source in &self.sources {
            Url::parse(&source.url).map_err(|e| {
                NewsDigestError::config(format!(
                    "source '{}' has an invalid url '{}': {e}",
                    source.name, source.url
                ))
            })?;
        }
        Url::parse(&self.feed.link).map_err(|e| {
            NewsDigestError::config(format!("feed.link '{}' is invalid: {e}", self.feed.link))
        })?;
        Ok(())
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory for generated feeds and the HTML page.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// SQLite database holding processed articles.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Only entries published within this many hours are ingested.
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,

    /// Content shorter than this (in characters) triggers a full-text fetch.
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,

    /// Timeout for feed and page requests.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// User agent sent to feed hosts.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pause between consecutive sources.
    #[serde(default = "default_source_pause")]
    pub source_pause_ms: u64,

    /// Keep entries that carry no publication date.
    #[serde(default = "default_true")]
    pub keep_undated: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            db_path: default_db_path(),
            window_hours: default_window_hours(),
            min_content_length: default_min_content_length(),
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
            source_pause_ms: default_source_pause(),
            keep_undated: true,
        }
    }
}

fn default_output_dir() -> String {
    "output".into()
}
fn default_db_path() -> String {
    "data/articles.db".into()
}
fn default_window_hours() -> u32 {
    24
}
fn default_min_content_length() -> usize {
    500
}
fn default_http_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("NewsletterDigest/", env!("CARGO_PKG_VERSION")).into()
}
fn default_source_pause() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}

/// Supported AI backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Kimi,
    OpenAi,
    OpenRouter,
    Anthropic,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kimi => "kimi",
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
            Self::Anthropic => "anthropic",
        }
    }

    /// Environment variable holding the API key when none is configured.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::Kimi => "MOONSHOT_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Kimi => "https://api.kimi.com/coding/v1",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::Anthropic => "https://api.anthropic.com",
        }
    }

    /// `(light, full)` model pair.
    pub fn default_models(&self) -> (&'static str, &'static str) {
        match self {
            Self::Kimi => ("kimi-k2", "kimi-k2"),
            Self::OpenAi => ("gpt-4o-mini", "gpt-4o"),
            Self::OpenRouter => ("moonshotai/kimi-k2", "moonshotai/kimi-k2.5"),
            Self::Anthropic => ("claude-haiku-4-5-20251001", "claude-sonnet-4-5-20250929"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = NewsDigestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kimi" | "moonshot" => Ok(Self::Kimi),
            "openai" => Ok(Self::OpenAi),
            "openrouter" => Ok(Self::OpenRouter),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(NewsDigestError::config(format!(
                "unknown llm provider '{other}' (expected kimi, openai, openrouter or anthropic)"
            ))),
        }
    }
}

/// `[llm]` section. Unset fields resolve from the provider's presets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model for summaries, tags, quotes and tone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_model: Option<String>,

    /// Model for translation and the daily report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Article text beyond this many characters is truncated before sending.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Language summaries and translations are written in.
    #[serde(default = "default_target_language")]
    pub target_language: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            api_key_env: None,
            base_url: None,
            light_model: None,
            model: None,
            temperature: default_temperature(),
            max_input_chars: default_max_input_chars(),
            timeout_secs: default_llm_timeout(),
            target_language: default_target_language(),
        }
    }
}

impl LlmConfig {
    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_key_env())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    pub fn light_model(&self) -> &str {
        self.light_model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_models().0)
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_models().1)
    }

    /// Switch provider, dropping presets that belonged to the previous one.
    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        if provider != self.provider {
            self.provider = provider;
            self.api_key_env = None;
            self.base_url = None;
            self.light_model = None;
            self.model = None;
        }
        self
    }
}

fn default_temperature() -> f32 {
    0.3
}
fn default_max_input_chars() -> usize {
    30_000
}
fn default_llm_timeout() -> u64 {
    120
}
fn default_target_language() -> String {
    "Simplified Chinese".into()
}

/// `[feed]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedMetaConfig {
    #[serde(default = "default_feed_title")]
    pub title: String,

    #[serde(default = "default_feed_description")]
    pub description: String,

    /// Public base URL the output directory is served from.
    #[serde(default = "default_feed_link")]
    pub link: String,

    #[serde(default = "default_feed_language")]
    pub language: String,
}

impl Default for FeedMetaConfig {
    fn default() -> Self {
        Self {
            title: default_feed_title(),
            description: default_feed_description(),
            link: default_feed_link(),
            language: default_feed_language(),
        }
    }
}

fn default_feed_title() -> String {
    "AI/产品/技术日报".into()
}
fn default_feed_description() -> String {
    "每日聚合英文 Newsletter/博客，AI 翻译生成中文摘要和全文".into()
}
fn default_feed_link() -> String {
    "http://localhost:8080".into()
}
fn default_feed_language() -> String {
    "zh-CN".into()
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.newsdigest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NewsDigestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.newsdigest/newsdigest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NewsDigestError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        NewsDigestError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NewsDigestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig {
        sources: builtin_sources(SourceSet::Mvp),
        ..AppConfig::default()
    };
    let content =
        toml::to_string_pretty(&config).map_err(|e| NewsDigestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NewsDigestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the API key env var for the configured provider is set and non-empty,
/// returning the key.
pub fn validate_api_key(config: &LlmConfig) -> Result<String> {
    let var_name = config.api_key_env();
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(NewsDigestError::config(format!(
            "API key for provider '{}' not found. Set the {var_name} environment variable.",
            config.provider.as_str()
        ))),
    }
}
