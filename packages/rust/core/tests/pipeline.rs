//! End-to-end runs against a mocked feed host and a fake capability.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use newsdigest_core::{
    DigestItem, EnrichmentCapability, QuotesAndTone, RunOptions, SilentProgress, render_from_store,
    run_digest,
};
use newsdigest_shared::{AppConfig, FeedSource, NewsDigestError, Result, Tone};
use newsdigest_storage::Storage;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY: &str = "Large language models are changing how we build software. \
    This paragraph is long enough that no full-text fetch is needed.";

struct FakeCapability {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeCapability {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: AtomicUsize::new(0),
        }
    }

    fn call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(NewsDigestError::Enrichment("backend unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EnrichmentCapability for FakeCapability {
    async fn summarize(&self, _: &str, _: &str) -> Result<String> {
        self.call()?;
        Ok("大模型正在改变软件开发。".into())
    }

    async fn extract_tags(&self, _: &str, _: &str) -> Result<Vec<String>> {
        self.call()?;
        Ok(vec!["LLM".into(), "编程".into()])
    }

    async fn translate(&self, _: &str, _: &str) -> Result<String> {
        self.call()?;
        Ok("<p>大模型正在改变我们构建软件的方式。</p>".into())
    }

    async fn extract_quotes_and_tone(&self, _: &str, _: &str) -> Result<QuotesAndTone> {
        self.call()?;
        Ok(QuotesAndTone {
            quotes: vec![],
            tone: Tone::Analytical,
            translated_title: "大模型与软件".into(),
        })
    }

    async fn generate_daily_report(&self, items: &[DigestItem]) -> Result<String> {
        self.call()?;
        Ok(format!("## LLM & AI 工具\n\n共 {} 篇", items.len()))
    }
}

fn feed_xml() -> String {
    let date = (Utc::now() - TimeDelta::hours(1)).to_rfc2822();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Mock</title><link>https://example.com</link><description>d</description>
<item><title>LLMs and Software</title><link>https://example.com/llms</link><pubDate>{date}</pubDate>
<description><![CDATA[<p>{BODY}</p>]]></description></item>
</channel></rss>"#
    )
}

struct Fixture {
    _server: MockServer,
    config: AppConfig,
    options: RunOptions,
}

impl Fixture {
    async fn new() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(feed_xml()))
            .mount(&server)
            .await;

        let root = std::env::temp_dir().join(format!("nd_pipeline_{}", Uuid::now_v7()));
        let mut config = AppConfig::default();
        config.defaults.output_dir = root.join("output").display().to_string();
        config.defaults.db_path = root.join("data").join("articles.db").display().to_string();
        config.defaults.source_pause_ms = 0;
        config.defaults.min_content_length = 20;

        let options = RunOptions {
            sources: vec![FeedSource::new(
                "Mock",
                format!("{}/feed.xml", server.uri()),
                "tech",
                "",
            )],
            dry_run: false,
            days: None,
        };

        Self {
            _server: server,
            config,
            options,
        }
    }

    fn output(&self, file: &str) -> PathBuf {
        PathBuf::from(&self.config.defaults.output_dir).join(file)
    }

    async fn stored(&self) -> u64 {
        Storage::open(PathBuf::from(&self.config.defaults.db_path).as_path())
            .await
            .unwrap()
            .count()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn run_enriches_persists_and_renders() {
    let fx = Fixture::new().await;
    let cap = FakeCapability::new(false);

    let summary = run_digest(&fx.config, &fx.options, Some(&cap), &SilentProgress)
        .await
        .unwrap();

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.enriched, 1);
    assert_eq!(summary.outputs.len(), 3);
    assert_eq!(fx.stored().await, 1);

    let articles = std::fs::read_to_string(fx.output("articles.xml")).unwrap();
    assert!(articles.contains("[翻译] Mock: 大模型与软件"));
    assert!(articles.contains("https://example.com/llms"));

    let digest = std::fs::read_to_string(fx.output("daily-digest.xml")).unwrap();
    assert!(digest.contains("共 1 篇"));

    let page = std::fs::read_to_string(fx.output("index.html")).unwrap();
    assert!(page.contains("大模型与软件"));
    assert!(page.contains("LLMs and Software"));
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let fx = Fixture::new().await;
    run_digest(&fx.config, &fx.options, Some(&FakeCapability::new(false)), &SilentProgress)
        .await
        .unwrap();

    let cap = FakeCapability::new(false);
    let summary = run_digest(&fx.config, &fx.options, Some(&cap), &SilentProgress)
        .await
        .unwrap();

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.enriched, 0);
    assert_eq!(summary.skipped, 1);
    assert!(summary.outputs.is_empty());
    assert_eq!(cap.calls.load(Ordering::SeqCst), 0);
    assert_eq!(fx.stored().await, 1);
}

#[tokio::test]
async fn failing_capability_leaves_no_record_and_no_outputs() {
    let fx = Fixture::new().await;
    let summary = run_digest(&fx.config, &fx.options, Some(&FakeCapability::new(true)), &SilentProgress)
        .await
        .unwrap();

    assert_eq!(summary.enriched, 0);
    assert_eq!(summary.failed, 1);
    assert!(summary.outputs.is_empty());
    assert_eq!(fx.stored().await, 0);
}

#[tokio::test]
async fn dry_run_renders_without_store() {
    let fx = Fixture::new().await;
    let options = RunOptions {
        dry_run: true,
        ..fx.options.clone()
    };

    let summary = run_digest(&fx.config, &options, None, &SilentProgress)
        .await
        .unwrap();

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.outputs.len(), 3);
    assert!(!PathBuf::from(&fx.config.defaults.db_path).exists());

    let page = std::fs::read_to_string(fx.output("index.html")).unwrap();
    assert!(page.contains("今日文章"));
    assert!(page.contains("LLMs and Software"));
}

#[tokio::test]
async fn capability_required_outside_dry_run() {
    let fx = Fixture::new().await;
    let err = run_digest(&fx.config, &fx.options, None, &SilentProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, NewsDigestError::Config { .. }));
}

#[tokio::test]
async fn render_rebuilds_outputs_from_store() {
    let fx = Fixture::new().await;
    run_digest(&fx.config, &fx.options, Some(&FakeCapability::new(false)), &SilentProgress)
        .await
        .unwrap();
    std::fs::remove_file(fx.output("index.html")).unwrap();

    let written = render_from_store(&fx.config, Utc::now().date_naive())
        .await
        .unwrap();

    assert_eq!(written.len(), 3);
    let page = std::fs::read_to_string(fx.output("index.html")).unwrap();
    assert!(page.contains("大模型与软件"));
    assert!(page.contains("LLM &amp; AI 工具"));
}

#[tokio::test]
async fn render_without_store_fails() {
    let fx = Fixture::new().await;
    assert!(render_from_store(&fx.config, Utc::now().date_naive()).await.is_err());
}
