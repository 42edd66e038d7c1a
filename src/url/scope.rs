use crate::url::extract_domain;
use url::Url;

/// Domain scope of one crawl run
///
/// With an explicit allowed domain a URL is in scope iff its host ends with
/// that domain. Without one, only the seed's own host is crawled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlScope {
    /// Host must end with this (lowercased) suffix
    DomainSuffix(String),
    /// Host must equal the seed host
    SeedHost(String),
}

impl CrawlScope {
    /// Builds the scope for a run from its seed and optional allowed domain
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use company_scout::url::CrawlScope;
    ///
    /// let seed = Url::parse("https://directory.example.jp/").unwrap();
    /// let scope = CrawlScope::new(&seed, Some("example.jp"));
    /// assert!(scope.contains(&Url::parse("https://www.example.jp/a").unwrap()));
    /// assert!(!scope.contains(&Url::parse("https://other.com/").unwrap()));
    /// ```
    pub fn new(seed: &Url, allowed_domain: Option<&str>) -> Self {
        match allowed_domain.map(str::trim).filter(|d| !d.is_empty()) {
            Some(domain) => Self::DomainSuffix(domain.to_lowercase()),
            None => Self::SeedHost(extract_domain(seed).unwrap_or_default()),
        }
    }

    /// Returns true if the URL may be fetched in this run
    pub fn contains(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        let Some(host) = extract_domain(url) else {
            return false;
        };

        match self {
            Self::DomainSuffix(domain) => host.ends_with(domain.as_str()),
            Self::SeedHost(seed_host) => host == *seed_host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_defaults_to_seed_host() {
        let scope = CrawlScope::new(&url("https://example.com/list"), None);

        assert_eq!(scope, CrawlScope::SeedHost("example.com".to_string()));
        assert!(scope.contains(&url("https://example.com/company/1")));
        assert!(!scope.contains(&url("https://sub.example.com/")));
        assert!(!scope.contains(&url("https://other.com/")));
    }

    #[test]
    fn test_blank_allowed_domain_falls_back_to_seed() {
        let scope = CrawlScope::new(&url("https://example.com/"), Some("  "));
        assert_eq!(scope, CrawlScope::SeedHost("example.com".to_string()));
    }

    #[test]
    fn test_allowed_domain_suffix() {
        let scope = CrawlScope::new(&url("https://portal.example.com/"), Some("Example.com"));

        assert!(scope.contains(&url("https://example.com/")));
        assert!(scope.contains(&url("https://a.b.example.com/x")));
        assert!(!scope.contains(&url("https://example.org/")));
    }

    #[test]
    fn test_non_http_schemes_out_of_scope() {
        let scope = CrawlScope::new(&url("https://example.com/"), None);
        assert!(!scope.contains(&url("ftp://example.com/file")));
        assert!(!scope.contains(&url("mailto:info@example.com")));
    }

    #[test]
    fn test_port_does_not_affect_scope() {
        let scope = CrawlScope::new(&url("http://127.0.0.1:5000/"), None);
        assert!(scope.contains(&url("http://127.0.0.1:5000/page")));
    }
}
