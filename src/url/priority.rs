use url::Url;

/// Priority assigned when no URL-shape heuristic matches
pub const DEFAULT_PRIORITY: u32 = 50;

/// Estimates a frontier priority for a URL from its shape alone (no fetch)
///
/// Listing and index pages are the cheapest to mine for postings and further
/// links, so they should be exhausted before budget goes to detail pages
/// that yield at most one posting each. Approximate ranking, highest first:
///
/// - 90: job-listing index pages (`…/jobs`, `…/jobs/search`, `…/careers`,
///   `/company/{slug}/jobs`)
/// - 85: company pages (`/company/{slug}`)
/// - 80: site root
/// - 75: paginated listing pages (`page=N` query)
/// - 70: category/department pages
/// - 50: everything else
/// - 40: individual job detail pages
///
/// Priorities are assigned at frontier-insertion time and never recomputed.
pub fn estimate_priority(url: &str) -> u32 {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return DEFAULT_PRIORITY,
    };

    let path = parsed.path().trim_end_matches('/').to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let has_page_param = parsed
        .query_pairs()
        .any(|(k, v)| k == "page" && v.parse::<u32>().is_ok());

    if is_listing_index(&path, &segments) {
        return if has_page_param { 75 } else { 90 };
    }

    if segments.len() == 2 && segments[0] == "company" {
        return 85;
    }

    if segments.is_empty() {
        return 80;
    }

    if has_page_param {
        return 75;
    }

    if is_category_page(&segments) {
        return 70;
    }

    if is_job_detail(&segments) {
        return 40;
    }

    DEFAULT_PRIORITY
}

/// Listing index shapes: `…/jobs`, `…/jobs/search`, `…/careers`,
/// `/company/{slug}/jobs`
fn is_listing_index(path: &str, segments: &[&str]) -> bool {
    if path.ends_with("/jobs") || path.ends_with("/careers") {
        return true;
    }
    if path.contains("/jobs/search") {
        return true;
    }
    segments.len() == 3 && segments[0] == "company" && segments[2] == "jobs"
}

fn is_category_page(segments: &[&str]) -> bool {
    segments.iter().any(|s| {
        matches!(
            *s,
            "departments" | "department" | "teams" | "team" | "categories" | "locations"
        )
    })
}

/// A job-container segment with something after it is a single-posting page
fn is_job_detail(segments: &[&str]) -> bool {
    segments.iter().enumerate().any(|(i, s)| {
        matches!(*s, "jobs" | "job" | "careers" | "positions" | "openings")
            && i + 1 < segments.len()
    })
}
