use url::Url;

/// Extracts the crawl domain from a URL
///
/// The domain is the host together with an explicit port, so
/// `http://127.0.0.1:8080/` and `http://127.0.0.1:9090/` are different
/// domains. The `url` crate already lowercases hosts while parsing.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The host, with `:port` appended when one is present
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use md_crawler::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("localhost:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host.to_string()),
    }
}
