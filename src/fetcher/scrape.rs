//! Regex-based extraction of workshop items from Steam Community HTML.
//!
//! Matching is deliberately narrow: a class must match exactly (the page uses
//! `class="workshopItemTitle"`, not a class list), and every field is
//! optional. Missing fields become the fallback placeholders in
//! [`crate::record`].

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::record::{RawItem, UNKNOWN_AUTHOR, UNKNOWN_DESCRIPTION, UNKNOWN_TITLE};

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static COLLECTION_ITEM_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?i)<div\s+[^>]*class\s*=\s*["']collectionItem["'][^>]*>"#)
});
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)<a\s+[^>]*href\s*=\s*["']([^"']+)["']"#)
});
static PREVIEW_IMG_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)<img\s+[^>]*class\s*=\s*["']workshopItemPreviewImage["'][^>]*>"#)
});
static MAIN_PREVIEW_IMG_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)<img\s+[^>]*id\s*=\s*["']previewImageMain["'][^>]*>"#)
});
static PREVIEW_IMG_ID_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)<img\s+[^>]*id\s*=\s*["']previewImage["'][^>]*>"#)
});
static SRC_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#"(?is)\ssrc\s*=\s*["']([^"']*)["']"#));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?s)<[^>]*>"));
static BR_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"(?i)<br\s*/?>"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"&#(x[0-9a-fA-F]+|[0-9]+);"));
static ID_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"[?&]id=([^&#]+)"));

/// Opening tag of a `<div>` whose class is exactly `class`.
fn div_open_regex(class: &str) -> Regex {
    compile_static_regex(&format!(
        r#"(?is)<div\s+[^>]*class\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(class)
    ))
}

static TITLE_DIV_RE: LazyLock<Regex> = LazyLock::new(|| div_open_regex("workshopItemTitle"));
static AUTHOR_DIV_RE: LazyLock<Regex> = LazyLock::new(|| div_open_regex("workshopItemAuthor"));
static SHORT_DESC_DIV_RE: LazyLock<Regex> =
    LazyLock::new(|| div_open_regex("workshopItemShortDesc"));
static DESCRIPTION_DIV_RE: LazyLock<Regex> =
    LazyLock::new(|| div_open_regex("workshopItemDescription"));
static FRIEND_BLOCK_DIV_RE: LazyLock<Regex> =
    LazyLock::new(|| div_open_regex("friendBlockContent"));
static DIV_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)<(/?)div\b[^>]*>"));

/// Returns the inner HTML of the first div opened by `open_re`, up to its
/// matching `</div>`. Nested divs are skipped; an unclosed div runs to the
/// end of `html`.
fn div_inner_html<'a>(html: &'a str, open_re: &Regex) -> Option<&'a str> {
    let start = open_re.find(html)?.end();
    let rest = &html[start..];
    let mut depth = 0usize;
    for caps in DIV_TAG_RE.captures_iter(rest) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        let closing = caps.get(1).is_some_and(|slash| !slash.as_str().is_empty());
        if closing {
            if depth == 0 {
                return Some(&rest[..tag.start()]);
            }
            depth -= 1;
        } else {
            depth += 1;
        }
    }
    Some(rest)
}

/// Inner text of the first div opened by `open_re`, or `None` when absent or blank.
fn div_text(html: &str, open_re: &Regex) -> Option<String> {
    div_inner_html(html, open_re)
        .map(html_to_text)
        .filter(|text| !text.is_empty())
}

fn img_src(html: &str, tag_re: &Regex) -> Option<String> {
    let tag = tag_re.find(html)?.as_str();
    SRC_ATTR_RE
        .captures(tag)
        .and_then(|caps| caps.get(1))
        .map(|m| html_unescape_basic(m.as_str().trim()))
        .filter(|src| !src.is_empty())
}

/// Converts an HTML fragment to trimmed plain text.
///
/// `<br>` becomes a newline, other tags are dropped, entities are decoded and
/// runs of spaces inside each line are collapsed.
#[must_use]
pub fn html_to_text(fragment: &str) -> String {
    let with_breaks = BR_RE.replace_all(fragment, "\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    let decoded = html_unescape_basic(&stripped);
    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn html_unescape_basic(value: &str) -> String {
    let named = value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}");
    let numeric = NUMERIC_ENTITY_RE.replace_all(&named, |caps: &regex::Captures<'_>| {
        let token = &caps[1];
        let code = match token.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => token.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), |ch| ch.to_string())
    });
    // `&amp;` last so `&amp;lt;` decodes to the literal text `&lt;`.
    numeric.replace("&amp;", "&")
}

/// Extracts the workshop id from an item link (`...filedetails/?id=123`).
#[must_use]
pub fn extract_workshop_id(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(link) {
        return url
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.trim().to_string())
            .filter(|id| !id.is_empty());
    }
    ID_PARAM_RE
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Splits a collection page into one HTML block per `collectionItem` div.
#[must_use]
pub fn collection_item_blocks(html: &str) -> Vec<&str> {
    let starts: Vec<usize> = COLLECTION_ITEM_START_RE
        .find_iter(html)
        .map(|m| m.start())
        .collect();
    starts
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let end = starts.get(index + 1).copied().unwrap_or(html.len());
            &html[start..end]
        })
        .collect()
}

/// Parses one collection block into an item.
///
/// Returns `None` when no workshop id can be extracted; the caller logs and
/// skips such blocks.
#[must_use]
pub fn parse_collection_item(block: &str) -> Option<RawItem> {
    let link = HREF_RE
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| html_unescape_basic(m.as_str().trim()))?;
    let id = extract_workshop_id(&link)?;

    Some(RawItem {
        id,
        title: div_text(block, &TITLE_DIV_RE).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        author: div_text(block, &AUTHOR_DIV_RE)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        short_description: div_text(block, &SHORT_DESC_DIV_RE)
            .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string()),
        workshop_link: link,
        image_url: img_src(block, &PREVIEW_IMG_TAG_RE).unwrap_or_default(),
    })
}

/// Parses a single workshop item page.
///
/// The id and link come from the request, not the page.
#[must_use]
pub fn parse_item_page(html: &str, id: &str, link: &str) -> RawItem {
    // The friend block holds the name followed by a `<br>` and online status.
    let author = div_inner_html(html, &FRIEND_BLOCK_DIV_RE)
        .map(|inner| {
            let name = BR_RE.split(inner).next().unwrap_or(inner);
            html_to_text(name)
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    RawItem {
        id: id.to_string(),
        title: div_text(html, &TITLE_DIV_RE).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        author,
        short_description: div_text(html, &DESCRIPTION_DIV_RE)
            .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string()),
        workshop_link: link.to_string(),
        image_url: img_src(html, &MAIN_PREVIEW_IMG_TAG_RE)
            .or_else(|| img_src(html, &PREVIEW_IMG_ID_TAG_RE))
            .unwrap_or_default(),
    }
}
