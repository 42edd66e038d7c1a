use url::Url;

/// Normalizes a URL into its canonical frontier form
///
/// # Normalization Steps
///
/// 1. Parse the URL; malformed input is returned unchanged
/// 2. Lowercase the scheme and host (done by the parser for http/https)
/// 3. Remove the fragment (everything after #)
/// 4. Strip a single trailing slash from a non-root path
///
/// Query strings are kept verbatim: two pages differing only by query are
/// distinct resources for a directory crawl.
///
/// # Examples
///
/// ```
/// use company_scout::url::normalize_url;
///
/// assert_eq!(
///     normalize_url("https://EXAMPLE.com/about/#team"),
///     "https://example.com/about"
/// );
/// assert_eq!(normalize_url("not a url"), "not a url");
/// ```
pub fn normalize_url(url_str: &str) -> String {
    match Url::parse(url_str.trim()) {
        Ok(url) => canonicalize(url).into(),
        Err(_) => url_str.to_string(),
    }
}

/// Applies the normalization steps to an already parsed URL
pub fn canonicalize(mut url: Url) -> Url {
    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path[..path.len() - 1].to_string();
        url.set_path(&trimmed);
    }

    url
}
