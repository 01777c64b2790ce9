use url::Url;

/// Normalizes a URL according to Jobtrail's dedup rules
///
/// # Normalization Steps
///
/// 1. Parse as an absolute URL; malformed input is returned unchanged
/// 2. Remove fragment (everything after #)
/// 3. Sort query parameters lexicographically by key
/// 4. Remove trailing slash from the path (except for root /)
///
/// Two URLs that normalize identically are considered the same page. This
/// function is the sole identity test used by the seen-set and by the link
/// filter's frontier-collision check, so it must stay deterministic and
/// total: it never fails.
///
/// # Examples
///
/// ```
/// use jobtrail::url::normalize_url;
///
/// let url = normalize_url("https://example.com/jobs/?b=2&a=1#top");
/// assert_eq!(url, "https://example.com/jobs?a=1&b=2");
///
/// // Malformed input passes through untouched
/// assert_eq!(normalize_url("not a url"), "not a url");
/// ```
pub fn normalize_url(url_str: &str) -> String {
    let mut url = match Url::parse(url_str.trim()) {
        Ok(u) => u,
        Err(_) => return url_str.to_string(),
    };

    // Relative references and scheme-only strings parse under some schemes
    // but have no host to dedup on; leave those untouched as well.
    if url.host_str().is_none() {
        return url_str.to_string();
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = sorted_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            let query_string = params
                .iter()
                .map(|(k, v)| {
                    if v.is_empty() {
                        k.clone()
                    } else {
                        format!("{}={}", k, v)
                    }
                })
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query_string));
        }
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

/// Collects query parameters sorted lexicographically by key
fn sorted_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}
