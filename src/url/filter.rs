use crate::url::domain::domains_related;
use crate::url::normalize::normalize_url;
use std::collections::HashSet;
use url::Url;

/// External applicant-tracking-system domains
///
/// Links into these hosts are terminal "apply here" handoffs, not crawlable
/// listing content.
const EXTERNAL_ATS_DOMAINS: &[&str] = &[
    "boards.greenhouse.io",
    "jobs.lever.co",
    "myworkdayjobs.com",
    "jobs.ashbyhq.com",
    "jobs.smartrecruiters.com",
    "apply.workable.com",
    "bamboohr.com",
    "jobvite.com",
    "icims.com",
    "taleo.net",
];

/// Path prefixes that never lead to crawlable pages
const ASSET_PATH_PREFIXES: &[&str] = &[
    "/api/",
    "/static/",
    "/assets/",
    "/_next/",
    "/_nuxt/",
    "/cdn-cgi/",
    "/wp-json/",
];

/// Auth and legal paths, matched exactly (never as a prefix)
///
/// Exact match only: `/company/login-startup` must survive the filter even
/// though it contains "login".
const AUTH_LEGAL_PATHS: &[&str] = &[
    "/login",
    "/logout",
    "/signin",
    "/sign-in",
    "/signup",
    "/sign-up",
    "/register",
    "/terms",
    "/terms-of-service",
    "/privacy",
    "/privacy-policy",
    "/cookies",
    "/legal",
];

/// File extensions that mark a URL as a non-page resource
const NON_PAGE_EXTENSIONS: &[&str] = &[
    "css", "js", "mjs", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "avif", "woff",
    "woff2", "ttf", "eot", "otf", "json", "xml", "map",
];

/// A candidate URL that survived filtering, ready for frontier insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    pub url: String,
    pub depth: u32,
}

/// Inputs the link filter needs from the surrounding crawl state
pub struct FilterContext<'a> {
    /// Domain of the source being crawled
    pub source_domain: &'a str,

    /// Normalized URLs already visited in this crawl
    pub url_seen: &'a HashSet<String>,

    /// URLs currently queued in the frontier (any form; normalized here)
    pub frontier_urls: &'a [String],

    /// Depth of the page the candidates were discovered on
    pub current_depth: u32,

    /// Maximum crawl depth from the source seed
    pub max_depth: u32,
}

/// Filters newly discovered URLs down to the crawlable subset
///
/// Keeps candidates that are same-domain (loose containment, so `www.` and
/// regional subdomains pass), unseen, not already queued, within the depth
/// budget, and not matching the asset/auth/ATS/extension blocklists. The
/// default is permissive: for this domain a missed page costs more than a
/// wasted fetch, so anything not explicitly blocked is kept.
///
/// Accepted URLs come back normalized with `depth = current_depth + 1`, and
/// are deduplicated against each other within the batch.
pub fn filter_links(candidates: &[String], ctx: &FilterContext<'_>) -> Vec<DiscoveredLink> {
    let next_depth = ctx.current_depth + 1;
    if next_depth > ctx.max_depth {
        return Vec::new();
    }

    // In-flight dedup: reject candidates already queued, in normalized form
    let mut queued: HashSet<String> = ctx
        .frontier_urls
        .iter()
        .map(|u| normalize_url(u))
        .collect();

    let mut accepted = Vec::new();

    for candidate in candidates {
        let normalized = normalize_url(candidate);

        if ctx.url_seen.contains(&normalized) || queued.contains(&normalized) {
            continue;
        }

        let parsed = match Url::parse(&normalized) {
            Ok(p) => p,
            Err(_) => continue,
        };

        let host = match parsed.host_str() {
            Some(h) => h.to_lowercase(),
            None => continue,
        };

        if !domains_related(&host, ctx.source_domain) {
            continue;
        }

        if is_external_ats(&host) {
            continue;
        }

        let path = parsed.path();

        if ASSET_PATH_PREFIXES.iter().any(|p| path.starts_with(p)) {
            continue;
        }

        if AUTH_LEGAL_PATHS.contains(&path) {
            continue;
        }

        if has_non_page_extension(path) {
            continue;
        }

        queued.insert(normalized.clone());
        accepted.push(DiscoveredLink {
            url: normalized,
            depth: next_depth,
        });
    }

    accepted
}

/// Checks if a host belongs to a known external ATS apply domain
fn is_external_ats(host: &str) -> bool {
    EXTERNAL_ATS_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

/// Checks if a path's final segment carries a non-page file extension
fn has_non_page_extension(path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            NON_PAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        }
        _ => false,
    }
}
