//! Chat-model backed implementation of [`EnrichmentCapability`].
//!
//! [`LlmCapability`] owns prompting, truncation, response parsing and usage
//! metering; a [`ChatBackend`] only moves one system + user message pair
//! over the wire.

mod anthropic;
mod openai;
mod prompts;

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use newsdigest_shared::{LlmConfig, LlmProvider, NewsDigestError, Result, validate_api_key};
use tracing::{debug, info};

use crate::enrichment::{
    DigestItem, EnrichmentCapability, OperationUsage, QuotesAndTone, UsageReport,
    parse_quotes_and_tone, parse_tags, strip_code_fence, truncate_content,
};

pub use anthropic::Anthropic;
pub use openai::OpenAiCompatible;

/// Input caps for the cheaper operations, applied on top of `max_input_chars`.
const TAGS_INPUT_CHARS: usize = 5_000;
const QUOTES_INPUT_CHARS: usize = 8_000;

/// User agent sent to model APIs.
const USER_AGENT: &str = concat!("newsdigest/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// A single-turn chat request.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
}

/// Model output plus token accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Transport for one chat API family.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: ChatRequest<'_>) -> Result<Completion>;
}

// ---------------------------------------------------------------------------
// Usage log
// ---------------------------------------------------------------------------

/// `(operation, input_tokens, output_tokens)` per successful call.
#[derive(Debug, Default)]
struct UsageLog {
    entries: Mutex<Vec<(&'static str, u64, u64)>>,
}

impl UsageLog {
    fn record(&self, operation: &'static str, completion: &Completion) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.push((operation, completion.input_tokens, completion.output_tokens));
    }

    fn report(&self) -> UsageReport {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let mut report = UsageReport::default();
        for &(operation, input, output) in entries.iter() {
            report.total_input_tokens += input;
            report.total_output_tokens += output;
            report.total_calls += 1;
            let op: &mut OperationUsage = report
                .by_operation
                .entry(operation.to_string())
                .or_default();
            op.input_tokens += input;
            op.output_tokens += output;
            op.calls += 1;
        }
        report
    }
}

// ---------------------------------------------------------------------------
// LlmCapability
// ---------------------------------------------------------------------------

/// [`EnrichmentCapability`] over any [`ChatBackend`].
///
/// Summaries, tags and quotes use the light model; translation and the
/// daily report use the full model.
pub struct LlmCapability<B> {
    backend: B,
    light_model: String,
    model: String,
    temperature: f32,
    max_input_chars: usize,
    target_language: String,
    usage: UsageLog,
}

impl<B: ChatBackend> LlmCapability<B> {
    pub fn new(backend: B, config: &LlmConfig) -> Self {
        Self {
            backend,
            light_model: config.light_model().to_string(),
            model: config.model().to_string(),
            temperature: config.temperature,
            max_input_chars: config.max_input_chars,
            target_language: config.target_language.clone(),
            usage: UsageLog::default(),
        }
    }

    async fn call(&self, operation: &'static str, model: &str, system: &str, user: &str) -> Result<String> {
        let completion = self
            .backend
            .complete(ChatRequest {
                model,
                system,
                user,
                temperature: self.temperature,
            })
            .await?;

        self.usage.record(operation, &completion);
        debug!(
            operation,
            model,
            backend = self.backend.name(),
            input_tokens = completion.input_tokens,
            output_tokens = completion.output_tokens,
            "model call"
        );
        Ok(completion.text)
    }

    fn body(&self, text: &str, cap: usize) -> String {
        truncate_content(text, cap.min(self.max_input_chars))
    }
}

#[async_trait]
impl<B: ChatBackend> EnrichmentCapability for LlmCapability<B> {
    async fn summarize(&self, text: &str, title: &str) -> Result<String> {
        let system = prompts::summarize(&self.target_language);
        let user = prompts::article_message(title, &self.body(text, usize::MAX));
        let raw = self.call("summarize", &self.light_model, &system, &user).await?;
        Ok(raw.trim().to_string())
    }

    async fn extract_tags(&self, text: &str, title: &str) -> Result<Vec<String>> {
        let system = prompts::extract_tags(&self.target_language);
        let user = prompts::article_message(title, &self.body(text, TAGS_INPUT_CHARS));
        let raw = self.call("extract_tags", &self.light_model, &system, &user).await?;
        Ok(parse_tags(&raw))
    }

    async fn translate(&self, text: &str, title: &str) -> Result<String> {
        let system = prompts::translate(&self.target_language);
        let user = prompts::article_message(title, &self.body(text, usize::MAX));
        let raw = self.call("translate", &self.model, &system, &user).await?;
        Ok(strip_code_fence(&raw).to_string())
    }

    async fn extract_quotes_and_tone(&self, text: &str, title: &str) -> Result<QuotesAndTone> {
        let system = prompts::quotes_and_tone(&self.target_language);
        let user = prompts::article_message(title, &self.body(text, QUOTES_INPUT_CHARS));
        let raw = self
            .call("quotes_and_tone", &self.light_model, &system, &user)
            .await?;
        Ok(parse_quotes_and_tone(&raw))
    }

    async fn generate_daily_report(&self, items: &[DigestItem]) -> Result<String> {
        let system = prompts::daily_report(&self.target_language);
        let user = prompts::report_message(items);
        let raw = self.call("daily_report", &self.model, &system, &user).await?;
        Ok(raw.trim().to_string())
    }

    fn usage(&self) -> UsageReport {
        self.usage.report()
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build the capability for the configured provider.
///
/// Fails when the provider's API key environment variable is unset.
pub fn create_capability(config: &LlmConfig) -> Result<Box<dyn EnrichmentCapability>> {
    let api_key = validate_api_key(config)?;
    let timeout = Duration::from_secs(config.timeout_secs);

    info!(
        provider = config.provider.as_str(),
        light_model = config.light_model(),
        model = config.model(),
        "using model provider"
    );

    let capability: Box<dyn EnrichmentCapability> = match config.provider {
        LlmProvider::Kimi | LlmProvider::OpenAi | LlmProvider::OpenRouter => {
            let backend = OpenAiCompatible::new(config.base_url(), api_key, timeout)?;
            Box::new(LlmCapability::new(backend, config))
        }
        LlmProvider::Anthropic => {
            let backend = Anthropic::new(config.base_url(), api_key, timeout)?;
            Box::new(LlmCapability::new(backend, config))
        }
    };
    Ok(capability)
}

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| NewsDigestError::Network(format!("failed to build HTTP client: {e}")))
}

/// Error for a non-2xx model API response, with a short body excerpt.
fn api_error(backend: &str, status: reqwest::StatusCode, body: &str) -> NewsDigestError {
    let excerpt: String = body.chars().take(300).collect();
    NewsDigestError::Enrichment(format!("{backend}: HTTP {status}: {excerpt}"))
}
