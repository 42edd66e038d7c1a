//! Parsed view of one HTML page
//!
//! `PageDocument` owns everything the extraction rules and the link
//! harvester read, so the `scraper::Html` tree never outlives the
//! synchronous parse.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never reaches the flattened page text
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// An `<a href>` element as found on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Whitespace-collapsed link text
    pub text: String,
    /// Raw, trimmed `href` attribute
    pub href: String,
    /// `href` resolved against the page URL, if it resolves
    pub url: Option<Url>,
    /// The element carries a `download` attribute
    pub download: bool,
}

/// A label/value pair from a `dt`/`dd` or `th`/`td` sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPair {
    pub label: String,
    pub value: String,
}

/// Extracted view of an HTML page
#[derive(Debug, Clone)]
pub struct PageDocument {
    /// Final (post-redirect) URL of the page
    pub url: Url,
    pub title: Option<String>,
    /// Every `h1` in document order
    pub headings: Vec<String>,
    /// `<meta property="og:site_name">` content
    pub og_site_name: Option<String>,
    /// Visible text, one space between text nodes
    pub text: String,
    pub anchors: Vec<Anchor>,
    pub label_pairs: Vec<LabelPair>,
}

impl PageDocument {
    /// Parses HTML fetched from `url`
    ///
    /// # Example
    ///
    /// ```
    /// use company_scout::extract::PageDocument;
    /// use url::Url;
    ///
    /// let html = r#"<html><head><title>山田建設</title></head>
    ///     <body><h1>株式会社山田建設</h1><a href="/contact">お問い合わせ</a></body></html>"#;
    /// let url = Url::parse("https://example.com/company/1").unwrap();
    /// let doc = PageDocument::parse(html, &url);
    ///
    /// assert_eq!(doc.headings, vec!["株式会社山田建設".to_string()]);
    /// assert_eq!(doc.anchors[0].url.as_ref().unwrap().as_str(), "https://example.com/contact");
    /// ```
    pub fn parse(html: &str, url: &Url) -> Self {
        let document = Html::parse_document(html);

        Self {
            url: url.clone(),
            title: first_text(&document, "title"),
            headings: all_text(&document, "h1"),
            og_site_name: og_site_name(&document),
            text: flatten_text(&document),
            anchors: anchors(&document, url),
            label_pairs: label_pairs(&document),
        }
    }
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    all_text(document, selector).into_iter().next()
}

fn all_text(document: &Html, selector: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .collect()
}

fn og_site_name(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[property="og:site_name"]"#).ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .find(|s| !s.is_empty())
}

/// Visible text of the whole document, script and style content excluded
fn flatten_text(document: &Html) -> String {
    let mut parts = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(collapse_whitespace(trimmed));
        }
    }

    parts.join(" ")
}

fn anchors(document: &Html, base_url: &Url) -> Vec<Anchor> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim().to_string();
            if href.is_empty() {
                return None;
            }

            Some(Anchor {
                text: element_text(element),
                url: base_url.join(&href).ok(),
                download: element.value().attr("download").is_some(),
                href,
            })
        })
        .collect()
}

fn label_pairs(document: &Html) -> Vec<LabelPair> {
    let Ok(selector) = Selector::parse("dt, th") else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    for label in document.select(&selector) {
        let value_name = if label.value().name() == "dt" { "dd" } else { "td" };

        let value = label
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .filter(|sibling| sibling.value().name() == value_name);

        if let Some(value) = value {
            pairs.push(LabelPair {
                label: element_text(label),
                value: element_text(value),
            });
        }
    }

    pairs
}
