//! Toot text preparation
//!
//! The Mastodon API delivers toot content as HTML; the destination wants
//! plain text with a character budget. This module converts, unshortens
//! links, strips attachment URLs, defuses mentions, and composes the final
//! tweet text with the toot permalink.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::Url;

use crate::error::{PlatformError, Result};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static PARA_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p>\s*<p[^>]*>").expect("valid regex"));
static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<a[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#).expect("valid regex"));
static HASHTAG_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[#(.*?)\]\(.*?\)").expect("valid regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]\((.*?)\)").expect("valid regex"));
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\s(]@)(\w)").expect("valid regex"));
static TRAILING_WS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("valid regex"));
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid regex"));

/// Characters that a naive HTML-to-text pass would collapse or reinterpret,
/// escaped as entities before conversion and restored by the single-pass
/// entity decode afterwards. The round trip is exact: Mastodon HTML-escapes
/// any literal `&` in the source text, so these placeholders cannot collide
/// with pre-existing input.
const ESCAPES: [(char, &str); 6] = [
    ('\n', "<br>"),
    (' ', "&nbsp;"),
    ('\\', "&#92;"),
    ('+', "&#43;"),
    ('-', "&#45;"),
    ('.', "&#46;"),
];

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    'chars: for c in text.chars() {
        for (plain, escaped) in ESCAPES {
            if c == plain {
                out.push_str(escaped);
                continue 'chars;
            }
        }
        out.push(c);
    }
    out
}

/// Apply the reversible escapes to character data only, leaving markup
/// untouched so tags stay parseable.
fn escape_character_data(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for m in TAG_RE.find_iter(html) {
        out.push_str(&escape_text(&html[last..m.start()]));
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&escape_text(&html[last..]));
    out
}

/// Convert toot HTML to plain text with no line wrapping.
///
/// Anchors pass through a markdown intermediate form so hashtag links can be
/// rewritten to bare `#tag` and every other link to its bare URL.
pub fn html_to_text(html: &str) -> String {
    let escaped = escape_character_data(html);

    let s = BR_RE.replace_all(&escaped, "\n");
    let s = PARA_BREAK_RE.replace_all(&s, "\n\n");
    let s = ANCHOR_RE.replace_all(&s, |caps: &regex::Captures| {
        let inner = TAG_RE.replace_all(&caps[2], "");
        format!("[{}]({})", inner, &caps[1])
    });
    let s = TAG_RE.replace_all(&s, "");

    let s = html_escape::decode_html_entities(&s).replace('\u{a0}', " ");

    // hashtag links first, then every remaining link to its bare URL
    let s = HASHTAG_LINK_RE.replace_all(&s, "#$1");
    let s = LINK_RE.replace_all(&s, "$1");

    s.trim().to_string()
}

/// Renders toot HTML into destination-ready plain text.
pub struct Renderer {
    http: reqwest::Client,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        // Redirects are never followed: link expansion reads the Location
        // header of the first response.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Full pre-post pipeline: HTML conversion, link expansion, removal of
    /// `remove_words` (attachment URLs already carried as media), mention
    /// defusing, whitespace cleanup.
    pub async fn render(&self, html: &str, remove_words: &[String]) -> String {
        let text = html_to_text(html);
        let mut text = self.expand_links(text).await;

        for word in remove_words {
            text = text.replace(word.as_str(), "");
        }

        // A dot after the @ keeps the destination platform from notifying
        // whoever happens to own the same username there.
        let text = MENTION_RE.replace_all(&text, "${1}.${2}");
        let text = TRAILING_WS_RE.replace_all(&text, "\n");

        text.trim().to_string()
    }

    /// Unshorten links with a HEAD request per URL token. A failed request
    /// leaves the original link in place.
    async fn expand_links(&self, text: String) -> String {
        let links: Vec<String> = text
            .split_whitespace()
            .filter(|w| w.starts_with("http://") || w.starts_with("https://"))
            .filter(|w| Url::parse(w).is_ok())
            .map(str::to_string)
            .collect();

        let mut text = text;
        for link in links {
            match self.http.head(&link).send().await {
                Ok(resp) => {
                    if let Some(location) = resp
                        .headers()
                        .get(reqwest::header::LOCATION)
                        .and_then(|v| v.to_str().ok())
                    {
                        text = text.replace(&link, location);
                    }
                }
                Err(e) => warn!(link = %link, error = %e, "HEAD request failed"),
            }
        }
        text
    }
}

/// Assemble the final tweet text within the destination's length budget.
///
/// The first inline URL is pulled out before truncation so the ellipsis cuts
/// text, never the link. The budget starts at 253 (the permalink is already
/// accounted for) and drops by 23 more when an inline URL is present, since
/// the destination counts any URL as a fixed 23 characters. With no inline
/// URL the segment is simply omitted.
pub fn compose_tweet(text: &str, permalink: &str) -> String {
    let url = URL_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let reduced = URL_RE.replace_all(text, "").into_owned();

    let budget = if url.is_empty() { 253 } else { 253 - 23 };

    let body = if text.chars().count() > budget {
        let mut truncated: String = reduced.chars().take(budget).collect();
        truncated.push_str("...");
        truncated
    } else {
        reduced
    };

    [body.trim(), url.as_str(), permalink]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERMALINK: &str = "https://example.social/@me/1";

    #[test]
    fn test_html_to_text_escape_round_trip() {
        let text = html_to_text("<p>1 + 1 - 2.0 \\ ok</p>");
        assert_eq!(text, "1 + 1 - 2.0 \\ ok");
    }

    #[test]
    fn test_html_to_text_preserves_line_breaks() {
        let text = html_to_text("<p>first<br>second<br />third</p>");
        assert_eq!(text, "first\nsecond\nthird");
    }

    #[test]
    fn test_html_to_text_paragraph_breaks() {
        let text = html_to_text("<p>one</p><p>two</p>");
        assert_eq!(text, "one\n\ntwo");
    }

    #[test]
    fn test_html_to_text_hashtag_links_become_bare_tags() {
        let html = r##"<p><a href="https://example.social/tags/rust" class="mention hashtag" rel="tag">#<span>rust</span></a> is nice</p>"##;
        assert_eq!(html_to_text(html), "#rust is nice");
    }

    #[test]
    fn test_html_to_text_links_become_bare_urls() {
        let html = r#"<p>see <a href="https://example.com/post"><span>example.com/post</span></a></p>"#;
        assert_eq!(html_to_text(html), "see https://example.com/post");
    }

    #[test]
    fn test_html_to_text_decodes_entities() {
        assert_eq!(html_to_text("<p>a &amp; b &lt;ok&gt;</p>"), "a & b <ok>");
    }

    #[tokio::test]
    async fn test_render_removes_words() {
        let renderer = Renderer::new().expect("renderer");
        let text = renderer
            .render(
                "<p>photo files&#47;cat attached</p>",
                &["files/cat".to_string()],
            )
            .await;
        assert_eq!(text, "photo  attached");
    }

    #[tokio::test]
    async fn test_render_defuses_mentions() {
        let renderer = Renderer::new().expect("renderer");
        let text = renderer.render("<p>hi @alice (@bob too)</p>", &[]).await;
        assert_eq!(text, "hi @.alice (@.bob too)");
    }

    #[tokio::test]
    async fn test_render_strips_trailing_whitespace() {
        let renderer = Renderer::new().expect("renderer");
        let text = renderer.render("<p>line   <br>next</p>", &[]).await;
        assert_eq!(text, "line\nnext");
    }

    #[test]
    fn test_compose_short_text_without_url() {
        let out = compose_tweet("hello world", PERMALINK);
        assert_eq!(out, format!("hello world {}", PERMALINK));
    }

    #[test]
    fn test_compose_truncates_long_text_without_url() {
        let text = "a".repeat(300);
        let out = compose_tweet(&text, PERMALINK);
        let expected_body: String = "a".repeat(253) + "...";
        assert_eq!(out, format!("{} {}", expected_body, PERMALINK));
    }

    #[test]
    fn test_compose_truncates_around_inline_url() {
        let text = format!("{} https://t.co/abc123", "b".repeat(300));
        let out = compose_tweet(&text, PERMALINK);

        let expected_body: String = "b".repeat(230) + "...";
        assert_eq!(
            out,
            format!("{} https://t.co/abc123 {}", expected_body, PERMALINK)
        );
    }

    #[test]
    fn test_compose_keeps_short_text_with_url_intact() {
        let out = compose_tweet("look https://t.co/x", PERMALINK);
        assert_eq!(out, format!("look https://t.co/x {}", PERMALINK));
    }

    #[test]
    fn test_compose_permalink_is_always_last() {
        for text in ["", "short", &"c".repeat(400)] {
            let out = compose_tweet(text, PERMALINK);
            assert!(out.ends_with(PERMALINK));
        }
    }

    #[test]
    fn test_compose_empty_text_is_just_the_permalink() {
        assert_eq!(compose_tweet("", PERMALINK), PERMALINK);
    }
}
