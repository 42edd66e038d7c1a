use serde::Deserialize;

/// Main configuration structure for Company-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub target: Option<TargetConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of deduplicated companies to collect
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Maximum number of page fetches per run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Lower bound of the randomized delay between fetches (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized delay between fetches (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Known targets may not exceed `max_pages * frontier_multiplier`
    #[serde(rename = "frontier-multiplier", default = "default_frontier_multiplier")]
    pub frontier_multiplier: usize,

    /// Overall wall-clock budget for one run (seconds)
    #[serde(rename = "run-timeout-secs", default)]
    pub run_timeout_secs: Option<u64>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the product token matched against robots.txt
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Full user agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory receiving the CSV export and the run statistics file
    #[serde(rename = "export-dir")]
    pub export_dir: String,
}

/// Vocabulary and thresholds used by the extractor
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Corporate-form and industry tokens identifying a company name
    #[serde(rename = "company-words", default = "default_company_words")]
    pub company_words: Vec<String>,

    /// Tokens identifying an inquiry/contact link
    #[serde(rename = "contact-words", default = "default_contact_words")]
    pub contact_words: Vec<String>,

    /// Tokens identifying an official homepage link
    #[serde(rename = "site-words", default = "default_site_words")]
    pub site_words: Vec<String>,

    /// Tokens identifying an address label in tables and definition lists
    #[serde(rename = "address-words", default = "default_address_words")]
    pub address_words: Vec<String>,

    /// Distinct keyword hits a page needs before extraction is attempted
    #[serde(rename = "min-keyword-hits", default = "default_min_keyword_hits")]
    pub min_keyword_hits: usize,

    /// Fill empty fields of an already-kept company from later duplicates
    #[serde(rename = "merge-fields", default)]
    pub merge_fields: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            company_words: default_company_words(),
            contact_words: default_contact_words(),
            site_words: default_site_words(),
            address_words: default_address_words(),
            min_keyword_hits: default_min_keyword_hits(),
            merge_fields: false,
        }
    }
}

/// Optional default crawl target, overridable from the command line
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    #[serde(rename = "allowed-domain", default)]
    pub allowed_domain: Option<String>,

    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
}

fn default_limit() -> usize {
    100
}

fn default_max_pages() -> usize {
    100
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    1500
}

fn default_request_timeout() -> u64 {
    15
}

fn default_frontier_multiplier() -> usize {
    5
}

fn default_min_keyword_hits() -> usize {
    1
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

fn default_company_words() -> Vec<String> {
    words(&[
        "株式会社",
        "有限会社",
        "合同会社",
        "建設",
        "工務店",
        "土木",
        "建築",
    ])
}

fn default_contact_words() -> Vec<String> {
    words(&[
        "お問い合わせ",
        "お問合せ",
        "問合せ",
        "contact",
        "inquiry",
    ])
}

fn default_site_words() -> Vec<String> {
    words(&[
        "公式サイト",
        "公式ホームページ",
        "ホームページ",
        "website",
        "site",
    ])
}

fn default_address_words() -> Vec<String> {
    words(&["住所", "所在地", "本社", "address"])
}

/// Keywords used when neither the config nor the caller supplies any
pub fn default_keywords() -> Vec<String> {
    words(&[
        "株式会社",
        "有限会社",
        "建設",
        "工務店",
        "お問い合わせ",
        "会社概要",
    ])
}
