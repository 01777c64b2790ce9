use url::Url;

/// Generates paginated variants of a listing URL for frontier seeding
///
/// Only activates when the path looks like a listing page (`…/jobs`,
/// `…/jobs/search`, or `/company/{slug}/jobs`); anything else returns empty.
/// When active, emits pages `2..=max_pages` by setting (or overwriting) the
/// `page` query parameter while leaving every other parameter untouched.
///
/// This is additive frontier seeding performed by the driver, not part of
/// the planner's decision loop.
///
/// # Examples
///
/// ```
/// use jobtrail::url::generate_pagination_seeds;
///
/// let seeds = generate_pagination_seeds("https://x.com/jobs", 4);
/// assert_eq!(seeds.len(), 3);
/// assert_eq!(seeds[0], "https://x.com/jobs?page=2");
///
/// assert!(generate_pagination_seeds("https://x.com/about", 4).is_empty());
/// ```
pub fn generate_pagination_seeds(listing_url: &str, max_pages: u32) -> Vec<String> {
    let url = match Url::parse(listing_url) {
        Ok(u) => u,
        Err(_) => return Vec::new(),
    };

    if !is_listing_path(url.path()) || max_pages < 2 {
        return Vec::new();
    }

    let base_pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    (2..=max_pages)
        .map(|page| {
            let mut seeded = url.clone();
            {
                let mut qp = seeded.query_pairs_mut();
                qp.clear();
                for (k, v) in &base_pairs {
                    qp.append_pair(k, v);
                }
                qp.append_pair("page", &page.to_string());
            }
            seeded.to_string()
        })
        .collect()
}

/// Listing shapes that paginate: `…/jobs`, `…/jobs/search`,
/// `/company/{slug}/jobs`
fn is_listing_path(path: &str) -> bool {
    let trimmed = path.trim_end_matches('/');

    if trimmed.ends_with("/jobs") || trimmed.contains("/jobs/search") {
        return true;
    }

    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    segments.len() == 3 && segments[0] == "company" && segments[2] == "jobs"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeds_for_jobs_listing() {
        let seeds = generate_pagination_seeds("https://x.com/jobs", 4);
        assert_eq!(
            seeds,
            vec![
                "https://x.com/jobs?page=2",
                "https://x.com/jobs?page=3",
                "https://x.com/jobs?page=4",
            ]
        );
    }

    #[test]
    fn test_non_listing_returns_empty() {
        assert!(generate_pagination_seeds("https://x.com/about", 4).is_empty());
        assert!(generate_pagination_seeds("https://x.com/", 4).is_empty());
    }

    #[test]
    fn test_company_jobs_listing() {
        let seeds = generate_pagination_seeds("https://board.com/company/acme/jobs", 3);
        assert_eq!(
            seeds,
            vec![
                "https://board.com/company/acme/jobs?page=2",
                "https://board.com/company/acme/jobs?page=3",
            ]
        );
    }

    #[test]
    fn test_search_listing() {
        let seeds = generate_pagination_seeds("https://x.com/jobs/search?q=rust", 3);
        assert_eq!(
            seeds,
            vec![
                "https://x.com/jobs/search?q=rust&page=2",
                "https://x.com/jobs/search?q=rust&page=3",
            ]
        );
    }

    #[test]
    fn test_existing_page_param_overwritten() {
        let seeds = generate_pagination_seeds("https://x.com/jobs?page=9&dept=eng", 3);
        assert_eq!(
            seeds,
            vec![
                "https://x.com/jobs?dept=eng&page=2",
                "https://x.com/jobs?dept=eng&page=3",
            ]
        );
    }

    #[test]
    fn test_max_pages_below_two() {
        assert!(generate_pagination_seeds("https://x.com/jobs", 1).is_empty());
        assert!(generate_pagination_seeds("https://x.com/jobs", 0).is_empty());
    }

    #[test]
    fn test_malformed_url() {
        assert!(generate_pagination_seeds("not a url", 4).is_empty());
    }
}
