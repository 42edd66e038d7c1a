//! Robots.txt evaluation
//!
//! Rule matching is delegated to the robotstxt crate (Google's matcher);
//! only the `Crawl-delay` extension is read by hand.

use robotstxt::DefaultMatcher;
use url::Url;

/// Robots.txt rules for one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRobots {
    /// Raw robots.txt body; empty means everything is allowed
    content: String,
}

impl ParsedRobots {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Rules that allow every URL
    ///
    /// Used whenever robots.txt is missing or cannot be retrieved.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    pub fn is_allow_all(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Checks if `url` may be fetched by the crawler named `agent`
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the page
    /// * `agent` - Product token of the crawler (e.g. `CompanyScout`), not the full header
    pub fn is_allowed(&self, url: &Url, agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url.as_str())
    }

    /// Crawl delay in seconds for `agent`
    ///
    /// A group naming the agent takes precedence over the `*` group.
    pub fn crawl_delay(&self, agent: &str) -> Option<f64> {
        let agent = agent.to_ascii_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut for_agent = None;
        let mut for_wildcard = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "user-agent" => {
                    // A user-agent line after rules opens a new group
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_ascii_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group.iter().any(|ua| ua == &agent) {
                        for_agent.get_or_insert(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        for_wildcard.get_or_insert(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        for_agent.or(for_wildcard).filter(|d| d.is_finite() && *d >= 0.0)
    }
}
