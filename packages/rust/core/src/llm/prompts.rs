//! System and user prompts for each capability operation.

use newsdigest_shared::Tone;

use crate::enrichment::DigestItem;

pub(crate) fn summarize(lang: &str) -> String {
    format!(
        "You are a professional technology editor. Write a concise summary of the \
         following article in {lang}, one or two sentences, that conveys its central \
         argument accurately and reads naturally. Reply with the summary only."
    )
}

pub(crate) fn extract_tags(lang: &str) -> String {
    format!(
        "You are a content classification expert. Extract 2-4 topic tags in {lang} for \
         the following article. Tags must be short (2-4 characters or one or two words) \
         and cover its core themes. Reply with a JSON array only, for example: \
         [\"LLM\", \"开源\", \"工具\"]"
    )
}

pub(crate) fn translate(lang: &str) -> String {
    format!(
        r#"You are a professional translator. Translate the following article into {lang} as bilingual side-by-side HTML.

Output rules (follow strictly):
- Go paragraph by paragraph: each original paragraph is followed immediately by its translation.
- Wrap each original paragraph in <div style="color:#8e8e93;font-size:14px;line-height:1.7;margin:20px 0 6px;">, keeping quotes, lists and code inside it as proper HTML.
- Wrap each translated paragraph in <p style="margin:4px 0 24px;line-height:1.8;font-size:15px;">.
- Images written as ![alt](url) become <img src="url" alt="alt" style="max-width:100%;border-radius:8px;margin:12px 0;"/> at the same position.
- Code blocks become <pre style="background:#1d1d1f;color:#f5f5f7;padding:16px;border-radius:8px;overflow-x:auto;font-size:13px;margin:12px 0;"><code>...</code></pre>; inline code becomes <code style="background:#f0f0f5;padding:2px 6px;border-radius:4px;font-size:13px;">.
- Highlight 2-4 key terms per paragraph: technical concepts and product names with <strong style="color:#c0392b;background:#fdf2f2;padding:1px 4px;border-radius:3px;">, people and companies with <strong style="color:#2471a3;background:#eaf4fd;padding:1px 4px;border-radius:3px;">.
- Headings use <h3 style="margin:24px 0 12px;"> or <h4>; block quotes use <blockquote style="border-left:3px solid #c0c0c0;padding:8px 16px;margin:8px 0;background:#f9f9fb;">; lists use <ul>/<ol> with <li>.
- Keep technical terms in the original language, with the translation in parentheses on first use.
- Translate accurately and fluently without over-interpreting.

Output the HTML directly, never inside a Markdown code block."#
    )
}

pub(crate) fn quotes_and_tone(lang: &str) -> String {
    let tones = Tone::ALL
        .iter()
        .map(|t| t.label())
        .collect::<Vec<_>>()
        .join(" / ");
    format!(
        r#"You are a professional content analyst. Complete three tasks:
1. Translate the article title into a concise {lang} title.
2. Pick 1-2 original sentences that best show the author's personal voice, and translate each into {lang}.
3. Judge the overall tone of the article, choosing exactly one of: {tones}

Reply with JSON only, without a Markdown code block:
{{"title_zh": "translated title", "quotes": [{{"en": "original sentence", "zh": "translation"}}], "tone": "{example}"}}"#,
        example = Tone::Experimental.label()
    )
}

pub(crate) fn daily_report(lang: &str) -> String {
    format!(
        "You are the editor of a daily AI / product / engineering newsletter written in \
         {lang}. Organise the provided articles into a concise Markdown digest.\n\
         Format:\n\
         - Group by theme, using the categories given with each article (for example: \
         LLM & AI 工具, 产品与增长, 工程与系统设计, 跨界与深度思考) as `##` headings.\n\
         - Under each heading list the related articles, summarising each in one or two sentences.\n\
         - Credit the author and source.\n\
         - Keep it brief and lead with the key information."
    )
}

/// User message for the per-article operations.
pub(crate) fn article_message(title: &str, body: &str) -> String {
    format!("Title: {title}\n\nContent:\n{body}")
}

/// User message listing every article for the daily report.
pub(crate) fn report_message(items: &[DigestItem]) -> String {
    let mut text = String::from("Today's articles:\n\n");
    for item in items {
        text.push_str(&format!(
            "---\nTitle: {}\nAuthor: {}\nSource: {}\nCategories: {}\nTags: {}\nSummary: {}\n\n",
            item.title,
            item.author,
            item.source_name,
            item.categories.join(", "),
            item.tags.join(", "),
            item.summary,
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_name_target_language() {
        for prompt in [
            summarize("Japanese"),
            extract_tags("Japanese"),
            translate("Japanese"),
            quotes_and_tone("Japanese"),
            daily_report("Japanese"),
        ] {
            assert!(prompt.contains("Japanese"));
        }
    }

    #[test]
    fn quotes_prompt_lists_every_tone() {
        let prompt = quotes_and_tone("Simplified Chinese");
        for tone in Tone::ALL {
            assert!(prompt.contains(tone.label()));
        }
        assert!(prompt.contains(r#"{"title_zh""#));
    }

    #[test]
    fn report_message_lists_items() {
        let items = vec![DigestItem {
            title: "T".into(),
            author: "A".into(),
            source_name: "S".into(),
            tags: vec!["x".into(), "y".into()],
            summary: "sum".into(),
            categories: vec!["产品与增长".into()],
        }];
        let msg = report_message(&items);
        assert!(msg.contains("Title: T\nAuthor: A\nSource: S\nCategories: 产品与增长\nTags: x, y\nSummary: sum"));
    }
}
