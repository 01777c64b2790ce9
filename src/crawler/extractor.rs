//! HTML job extractor: the default `JobExtractor`
//!
//! Harvests postings from JSON-LD `JobPosting` blocks first (the structured
//! path most career sites expose), then falls back to job-shaped anchors.
//! Postings are deduplicated by URL within one page.

use crate::crawler::collaborators::{JobExtractor, JobPosting};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Segments that mark an anchor as pointing at a single posting
const JOB_LINK_SEGMENTS: &[&str] = &["/jobs/", "/job/", "/careers/", "/positions/", "/openings/"];

/// Extracts postings from raw HTML
#[derive(Debug, Default)]
pub struct HtmlJobExtractor;

#[async_trait]
impl JobExtractor for HtmlJobExtractor {
    async fn extract(&self, html: &str, url: &str) -> Vec<JobPosting> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut postings = Vec::new();

        for posting in extract_json_ld(&document, url) {
            if seen.insert(posting.url.clone()) {
                postings.push(posting);
            }
        }

        for posting in extract_anchor_postings(&document, url) {
            if seen.insert(posting.url.clone()) {
                postings.push(posting);
            }
        }

        postings
    }
}

/// Walks `<script type="application/ld+json">` blocks for JobPosting nodes
fn extract_json_ld(document: &Html, page_url: &str) -> Vec<JobPosting> {
    let selector = match Selector::parse(r#"script[type="application/ld+json"]"#) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut postings = Vec::new();

    for element in document.select(&selector) {
        let raw = element.text().collect::<String>();
        let value: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(_) => continue,
        };

        collect_job_postings(&value, page_url, &mut postings);
    }

    postings
}

/// Recursively collects JobPosting objects from a JSON-LD value
///
/// Handles a bare object, a top-level array, `@graph`, and
/// `ItemList.itemListElement` wrappers.
fn collect_job_postings(value: &Value, page_url: &str, out: &mut Vec<JobPosting>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_job_postings(item, page_url, out);
            }
        }
        Value::Object(map) => {
            if map.get("@type").and_then(Value::as_str) == Some("JobPosting") {
                if let Some(posting) = job_posting_from_object(map, page_url) {
                    out.push(posting);
                }
                return;
            }

            for key in ["@graph", "itemListElement", "item"] {
                if let Some(nested) = map.get(key) {
                    collect_job_postings(nested, page_url, out);
                }
            }
        }
        _ => {}
    }
}

fn job_posting_from_object(
    map: &serde_json::Map<String, Value>,
    page_url: &str,
) -> Option<JobPosting> {
    let title = map.get("title").and_then(Value::as_str)?.trim().to_string();
    if title.is_empty() {
        return None;
    }

    let url = map
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| page_url.to_string());

    let location = map
        .get("jobLocation")
        .and_then(extract_locality)
        .filter(|l| !l.is_empty());

    Some(JobPosting {
        title,
        url,
        location,
    })
}

/// Pulls `address.addressLocality` from a jobLocation value (object or
/// array of objects)
fn extract_locality(location: &Value) -> Option<String> {
    match location {
        Value::Array(items) => items.iter().find_map(extract_locality),
        Value::Object(map) => map
            .get("address")
            .and_then(|a| a.get("addressLocality"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        _ => None,
    }
}

/// Fallback: anchors whose href looks like a single posting
fn extract_anchor_postings(document: &Html, page_url: &str) -> Vec<JobPosting> {
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let base = Url::parse(page_url).ok();
    let mut postings = Vec::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(h) => h,
            None => continue,
        };

        let lower = href.to_lowercase();
        let is_job_link = JOB_LINK_SEGMENTS
            .iter()
            .any(|seg| lower.contains(seg) && !lower.trim_end_matches('/').ends_with(seg.trim_end_matches('/')));
        if !is_job_link {
            continue;
        }

        let title = element.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let url = match &base {
            Some(b) => match b.join(href) {
                Ok(resolved) => resolved.to_string(),
                Err(_) => continue,
            },
            None => href.to_string(),
        };

        postings.push(JobPosting {
            title,
            url,
            location: None,
        });
    }

    postings
}
