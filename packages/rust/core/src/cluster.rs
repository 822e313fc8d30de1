//! Tag → umbrella category clustering.

use newsdigest_shared::Article;

/// Category for articles whose tags match nothing in [`CATEGORY_MAP`].
pub const DEFAULT_CATEGORY: &str = "跨界与深度思考";

const AI: &str = "LLM & AI 工具";
const PRODUCT: &str = "产品与增长";
const ENGINEERING: &str = "工程与系统设计";

/// Known tags and their umbrella category. Lookup ignores case.
const CATEGORY_MAP: &[(&str, &str)] = &[
    ("LLM", AI),
    ("AI", AI),
    ("AI工具", AI),
    ("AI tools", AI),
    ("大模型", AI),
    ("GPT", AI),
    ("Claude", AI),
    ("机器学习", AI),
    ("machine learning", AI),
    ("深度学习", AI),
    ("deep learning", AI),
    ("产品", PRODUCT),
    ("product", PRODUCT),
    ("增长", PRODUCT),
    ("growth", PRODUCT),
    ("产品策略", PRODUCT),
    ("用户体验", PRODUCT),
    ("UX", PRODUCT),
    ("工程", ENGINEERING),
    ("engineering", ENGINEERING),
    ("系统设计", ENGINEERING),
    ("system design", ENGINEERING),
    ("架构", ENGINEERING),
    ("architecture", ENGINEERING),
    ("数据结构", ENGINEERING),
    ("编程", ENGINEERING),
    ("programming", ENGINEERING),
    ("开源", ENGINEERING),
    ("open source", ENGINEERING),
    ("前端", ENGINEERING),
    ("frontend", ENGINEERING),
    ("后端", ENGINEERING),
    ("backend", ENGINEERING),
];

/// Umbrella category for a single tag, if it is a known one.
pub fn category_for_tag(tag: &str) -> Option<&'static str> {
    let tag = tag.trim();
    CATEGORY_MAP
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(tag))
        .map(|&(_, category)| category)
}

/// Distinct categories of an article in tag order.
///
/// Falls back to [`DEFAULT_CATEGORY`] only when no tag is recognised.
pub fn categories_for(article: &Article) -> Vec<&'static str> {
    let mut categories: Vec<&'static str> = Vec::new();
    for category in article.tags().iter().filter_map(|t| category_for_tag(t)) {
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    if categories.is_empty() {
        categories.push(DEFAULT_CATEGORY);
    }
    categories
}

/// Group articles by umbrella category.
///
/// Categories appear in order of first use; an article is listed at most
/// once per category but may appear under several.
pub fn cluster_by_topic(articles: &[Article]) -> Vec<(&'static str, Vec<&Article>)> {
    let mut clusters: Vec<(&'static str, Vec<&Article>)> = Vec::new();
    for article in articles {
        for category in categories_for(article) {
            match clusters.iter_mut().find(|(name, _)| *name == category) {
                Some((_, members)) => members.push(article),
                None => clusters.push((category, vec![article])),
            }
        }
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdigest_shared::{Enrichment, Tone};

    fn tagged(url: &str, tags: &[&str]) -> Article {
        Article {
            url: url.into(),
            title: url.into(),
            author: String::new(),
            source_name: "S".into(),
            published_at: None,
            content: "body".into(),
            enrichment: Some(Enrichment {
                summary: "s".into(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                translation: "<p>t</p>".into(),
                quotes: vec![],
                tone: Tone::default(),
                translated_title: String::new(),
            }),
        }
    }

    #[test]
    fn tag_lookup_ignores_case() {
        assert_eq!(category_for_tag("llm"), Some(AI));
        assert_eq!(category_for_tag(" Open Source "), Some(ENGINEERING));
        assert_eq!(category_for_tag("开源"), Some(ENGINEERING));
        assert_eq!(category_for_tag("哲学"), None);
    }

    #[test]
    fn unmatched_tags_fall_back_to_default() {
        let article = tagged("a", &["哲学", "写作"]);
        assert_eq!(categories_for(&article), vec![DEFAULT_CATEGORY]);
    }

    #[test]
    fn default_not_added_when_some_tag_matches() {
        let article = tagged("a", &["哲学", "LLM", "GPT", "产品"]);
        assert_eq!(categories_for(&article), vec![AI, PRODUCT]);
    }

    #[test]
    fn unenriched_article_goes_to_default() {
        let mut article = tagged("a", &["LLM"]);
        article.enrichment = None;
        assert_eq!(categories_for(&article), vec![DEFAULT_CATEGORY]);
    }

    #[test]
    fn clusters_keep_first_appearance_order() {
        let articles = vec![
            tagged("a", &["架构"]),
            tagged("b", &["LLM", "AI"]),
            tagged("c", &["编程", "大模型"]),
        ];
        let clusters = cluster_by_topic(&articles);
        let names: Vec<&str> = clusters.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec![ENGINEERING, AI]);

        let urls = |i: usize| -> Vec<&str> { clusters[i].1.iter().map(|a| a.url.as_str()).collect() };
        assert_eq!(urls(0), vec!["a", "c"]);
        assert_eq!(urls(1), vec!["b", "c"]);
    }

    #[test]
    fn empty_input_has_no_clusters() {
        assert!(cluster_by_topic(&[]).is_empty());
    }
}
