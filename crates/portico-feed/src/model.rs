//! Feed item shapes and presentation helpers.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One blog post in `blogs.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogPost {
    pub id: u64,
    pub title: String,
    /// Markdown body.
    pub content: String,
    /// Publication date, ISO `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub author: String,
    #[serde(default, rename = "authorImage")]
    pub author_image: Option<String>,
}

/// One coding challenge in `challenges.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Challenge {
    pub id: u64,
    /// Hosting platform, e.g. `leetcode`, used by the filter buttons.
    pub platform: String,
    pub title: String,
    pub difficulty: String,
    pub description: String,
    pub date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "problemUrl")]
    pub problem_url: Option<String>,
    #[serde(default, rename = "solutionUrl")]
    pub solution_url: Option<String>,
}

// ==================== Excerpts ====================

static MD_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("valid regex"));
static MD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid regex"));
static MD_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+").expect("valid regex"));
static MD_CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex"));
static MD_INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));
static MD_STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*|__([^_]+)__").expect("valid regex"));
static MD_EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*|_([^_]+)_").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strip markdown syntax, keeping the readable text.
pub fn strip_markdown(markdown: &str) -> String {
    let text = MD_IMAGE.replace_all(markdown, "");
    let text = MD_CODE_BLOCK.replace_all(&text, "");
    let text = MD_LINK.replace_all(&text, "$1");
    let text = MD_HEADING.replace_all(&text, "");
    let text = MD_STRONG.replace_all(&text, "$1$2");
    let text = MD_EMPHASIS.replace_all(&text, "$1$2");
    let text = MD_INLINE_CODE.replace_all(&text, "$1");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Plain-text excerpt of a markdown body, cut at `max_chars` with an ellipsis.
pub fn excerpt(markdown: &str, max_chars: usize) -> String {
    let text = strip_markdown(markdown);
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

impl BlogPost {
    /// Excerpt shown on the blog list, 150 characters like the site renders.
    pub fn excerpt(&self) -> String {
        excerpt(&self.content, 150)
    }
}

// ==================== Pagination ====================

/// One page of feed items.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
    /// Total items across all pages.
    pub total: usize,
    /// Whether a further page exists; drives the load-more control.
    pub has_more: bool,
}

/// Slice out one 1-based page. A `page` of zero is treated as the first page.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let start = (page - 1).saturating_mul(page_size);
    let end = start.saturating_add(page_size).min(items.len());
    let slice = if start < items.len() {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    Page {
        items: slice,
        page,
        page_size,
        total: items.len(),
        has_more: end < items.len(),
    }
}

/// Keep only challenges from one platform. `None` or `"all"` keeps everything.
pub fn filter_by_platform(challenges: &[Challenge], platform: Option<&str>) -> Vec<Challenge> {
    match platform {
        None | Some("all") => challenges.to_vec(),
        Some(platform) => challenges
            .iter()
            .filter(|c| c.platform == platform)
            .cloned()
            .collect(),
    }
}
