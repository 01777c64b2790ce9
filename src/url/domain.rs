use url::Url;

/// Extracts the host from a URL string
///
/// Returns the lowercase host portion, or None if the string does not parse
/// as an absolute URL with a host.
///
/// # Examples
///
/// ```
/// use jobtrail::url::extract_host;
///
/// assert_eq!(extract_host("https://Careers.Example.com/jobs"), Some("careers.example.com".to_string()));
/// assert_eq!(extract_host("not a url"), None);
/// ```
pub fn extract_host(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str).ok()?;
    url.host_str().map(|h| h.to_lowercase())
}

/// Tests whether a candidate host belongs to a crawl source's domain
///
/// The check is loose containment in both directions: `careers.example.com`
/// is related to `example.com`, and `example.com` is related to
/// `www.example.com`. This tolerates `www.` and regional subdomain variants
/// without maintaining an explicit alias list. Comparison is done on
/// lowercase forms.
///
/// # Examples
///
/// ```
/// use jobtrail::url::domains_related;
///
/// assert!(domains_related("careers.example.com", "example.com"));
/// assert!(domains_related("example.com", "www.example.com"));
/// assert!(!domains_related("example.com", "other.io"));
/// ```
pub fn domains_related(host: &str, source_domain: &str) -> bool {
    if host.is_empty() || source_domain.is_empty() {
        return false;
    }

    let host = host.to_lowercase();
    let source = source_domain.to_lowercase();

    host.contains(&source) || source.contains(&host)
}
