//! HTML link harvesting
//!
//! Pulls candidate URLs out of a fetched page for the link filter. The
//! filter applies all crawl policy; this module only resolves hrefs to
//! absolute URLs and drops schemes that can never be pages.

use scraper::{Html, Selector};
use url::Url;

/// Extracts all candidate links from an HTML document
///
/// Relative hrefs are resolved against `base_url`. `javascript:`,
/// `mailto:`, `tel:`, and `data:` links are dropped, as are anchors with a
/// `download` attribute. Everything else is returned as-is for the link
/// filter to judge.
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    let base = match Url::parse(base_url) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };

    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, &base) {
                    links.push(absolute);
                }
            }
        }
    }

    links
}

/// Extracts the page title, if present and non-empty
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolves a href to an absolute http(s) URL, or None if it can never be
/// a crawlable page
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let resolved = base.join(href).ok()?;

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
