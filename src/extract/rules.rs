//! Ordered extraction rules
//!
//! Each rule is a pure function of the page and the vocabulary. For every
//! field the first rule that yields a value wins; later rules for the same
//! field are not consulted.

use crate::extract::document::PageDocument;
use crate::extract::Vocabulary;
use regex::Regex;
use std::sync::LazyLock;

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});
static RE_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0\d{1,4}-\d{1,4}-\d{3,4}").unwrap());
static RE_POSTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"〒\s?\d{3}-?\d{4}|\d{3}-\d{4}").unwrap());

/// Separators between the company part and the rest of a `<title>`
const TITLE_SEPARATORS: &[&str] = &["｜", "|", "－", "-", "—", "–", "／", "/"];

/// Characters taken before and after the postal code for an address
const ADDRESS_CHARS_BEFORE: usize = 50;
const ADDRESS_CHARS_AFTER: usize = 80;

/// Entity field a rule fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Contact,
    Homepage,
    Email,
    Phone,
    Address,
}

pub struct Rule {
    pub name: &'static str,
    pub field: Field,
    pub apply: fn(&PageDocument, &Vocabulary) -> Option<String>,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "heading-with-corporate-token",
        field: Field::Name,
        apply: heading_with_corporate_token,
    },
    Rule {
        name: "og-site-name",
        field: Field::Name,
        apply: og_site_name,
    },
    Rule {
        name: "title-segment",
        field: Field::Name,
        apply: title_segment,
    },
    Rule {
        name: "contact-anchor",
        field: Field::Contact,
        apply: contact_anchor,
    },
    Rule {
        name: "homepage-anchor",
        field: Field::Homepage,
        apply: homepage_anchor,
    },
    Rule {
        name: "email-pattern",
        field: Field::Email,
        apply: email_pattern,
    },
    Rule {
        name: "phone-pattern",
        field: Field::Phone,
        apply: phone_pattern,
    },
    Rule {
        name: "postal-code-window",
        field: Field::Address,
        apply: postal_code_window,
    },
    Rule {
        name: "labelled-address",
        field: Field::Address,
        apply: labelled_address,
    },
];

/// True if `haystack` contains any token as an exact substring
pub fn contains_exact(haystack: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|token| haystack.contains(token.as_str()))
}

/// True if `haystack` contains any token
///
/// ASCII tokens match case-insensitively; all others need an exact substring.
pub fn contains_any(haystack: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|token| contains_token(haystack, token))
}

pub fn contains_token(haystack: &str, token: &str) -> bool {
    if token.is_ascii() {
        haystack.to_ascii_lowercase().contains(&token.to_ascii_lowercase())
    } else {
        haystack.contains(token)
    }
}

fn heading_with_corporate_token(doc: &PageDocument, vocab: &Vocabulary) -> Option<String> {
    doc.headings
        .iter()
        .find(|h| contains_any(h, &vocab.company_words))
        .cloned()
}

fn og_site_name(doc: &PageDocument, vocab: &Vocabulary) -> Option<String> {
    doc.og_site_name
        .as_ref()
        .filter(|name| contains_any(name, &vocab.company_words))
        .cloned()
}

fn title_segment(doc: &PageDocument, vocab: &Vocabulary) -> Option<String> {
    let title = doc.title.as_deref()?;

    for separator in TITLE_SEPARATORS {
        if let Some((left, _)) = title.split_once(separator) {
            let left = left.trim();
            if !left.is_empty() && contains_any(left, &vocab.company_words) {
                return Some(left.to_string());
            }
        }
    }

    contains_any(title, &vocab.company_words).then(|| title.to_string())
}

fn contact_anchor(doc: &PageDocument, vocab: &Vocabulary) -> Option<String> {
    doc.anchors
        .iter()
        .find(|a| contains_any(&a.text, &vocab.contact_words) || contains_any(&a.href, &vocab.contact_words))
        .and_then(|a| a.url.as_ref())
        .map(|url| url.to_string())
}

fn homepage_anchor(doc: &PageDocument, vocab: &Vocabulary) -> Option<String> {
    doc.anchors
        .iter()
        .find(|a| contains_exact(&a.text, &vocab.site_words))
        .and_then(|a| a.url.as_ref())
        .map(|url| url.to_string())
}

fn email_pattern(doc: &PageDocument, _vocab: &Vocabulary) -> Option<String> {
    RE_EMAIL.find(&doc.text).map(|m| m.as_str().to_string())
}

fn phone_pattern(doc: &PageDocument, _vocab: &Vocabulary) -> Option<String> {
    RE_PHONE.find(&doc.text).map(|m| m.as_str().to_string())
}

fn postal_code_window(doc: &PageDocument, _vocab: &Vocabulary) -> Option<String> {
    let text = &doc.text;
    let start = RE_POSTAL
        .find_iter(text)
        .find(|m| m.as_str().starts_with('〒') || is_free_standing(text, m.start(), m.end()))?
        .start();

    let chars_before = text[..start].chars().count();
    let window: String = text
        .chars()
        .skip(chars_before.saturating_sub(ADDRESS_CHARS_BEFORE))
        .take(ADDRESS_CHARS_BEFORE.min(chars_before) + ADDRESS_CHARS_AFTER)
        .collect();

    let window = window.trim();
    (!window.is_empty()).then(|| window.to_string())
}

/// A bare `ddd-dddd` must not be glued to other digits or hyphens
fn is_free_standing(text: &str, start: usize, end: usize) -> bool {
    let glued = |c: char| c.is_ascii_digit() || c == '-';
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(glued) && !after.is_some_and(glued)
}

fn labelled_address(doc: &PageDocument, vocab: &Vocabulary) -> Option<String> {
    doc.label_pairs
        .iter()
        .find(|pair| contains_any(&pair.label, &vocab.address_words) && !pair.value.is_empty())
        .map(|pair| pair.value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn doc(html: &str) -> PageDocument {
        PageDocument::parse(html, &Url::parse("https://example.com/c/1").unwrap())
    }

    fn rule(name: &str) -> &'static Rule {
        RULES.iter().find(|r| r.name == name).unwrap()
    }

    fn apply(name: &str, html: &str) -> Option<String> {
        (rule(name).apply)(&doc(html), &Vocabulary::default())
    }

    #[test]
    fn test_rule_names_unique() {
        for (i, a) in RULES.iter().enumerate() {
            for b in &RULES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_heading_needs_corporate_token() {
        assert_eq!(
            apply("heading-with-corporate-token", "<h1>ようこそ</h1><h1>山田建設株式会社</h1>"),
            Some("山田建設株式会社".to_string())
        );
        assert_eq!(apply("heading-with-corporate-token", "<h1>ようこそ</h1>"), None);
    }

    #[test]
    fn test_og_site_name() {
        let html = r#"<head><meta property="og:site_name" content="有限会社ミナト"></head>"#;
        assert_eq!(apply("og-site-name", html), Some("有限会社ミナト".to_string()));

        let html = r#"<head><meta property="og:site_name" content="ミナト"></head>"#;
        assert_eq!(apply("og-site-name", html), None);
    }

    #[test]
    fn test_title_left_segment() {
        assert_eq!(
            apply("title-segment", "<title>株式会社ABC｜会社概要</title>"),
            Some("株式会社ABC".to_string())
        );
        assert_eq!(
            apply("title-segment", "<title>株式会社ABC - 施工事例</title>"),
            Some("株式会社ABC".to_string())
        );
    }

    #[test]
    fn test_title_whole_when_left_has_no_token() {
        assert_eq!(
            apply("title-segment", "<title>施工事例 | 株式会社ABC</title>"),
            Some("施工事例 | 株式会社ABC".to_string())
        );
        assert_eq!(apply("title-segment", "<title>施工事例 | ABC</title>"), None);
    }

    #[test]
    fn test_contact_anchor_by_text_or_href() {
        assert_eq!(
            apply("contact-anchor", r#"<a href="/a">会社概要</a><a href="/form">お問い合わせ</a>"#),
            Some("https://example.com/form".to_string())
        );
        assert_eq!(
            apply("contact-anchor", r#"<a href="/Contact/">Send us a note</a>"#),
            Some("https://example.com/Contact/".to_string())
        );
        assert_eq!(
            apply("contact-anchor", r#"<a href="/x">CONTACT US</a>"#),
            Some("https://example.com/x".to_string())
        );
    }

    #[test]
    fn test_homepage_anchor_by_text_only() {
        assert_eq!(
            apply("homepage-anchor", r#"<a href="https://acme.example/">公式サイトはこちら</a>"#),
            Some("https://acme.example/".to_string())
        );
        assert_eq!(
            apply("homepage-anchor", r#"<a href="https://acme.example/website">こちら</a>"#),
            None
        );
    }

    #[test]
    fn test_homepage_anchor_is_case_sensitive() {
        assert_eq!(
            apply("homepage-anchor", r#"<a href="/sitemap">Site Map</a>"#),
            None
        );
        assert_eq!(
            apply("homepage-anchor", r#"<a href="/sitemap">SITEMAP</a>"#),
            None
        );
        assert_eq!(
            apply("homepage-anchor", r#"<a href="https://acme.example/">Visit our website</a>"#),
            Some("https://acme.example/".to_string())
        );
    }

    #[test]
    fn test_email_and_phone_patterns() {
        let html = "<p>メール: info@yamada-kensetsu.co.jp 電話: 03-1234-5678 / 045-987-6543</p>";
        assert_eq!(
            apply("email-pattern", html),
            Some("info@yamada-kensetsu.co.jp".to_string())
        );
        assert_eq!(apply("phone-pattern", html), Some("03-1234-5678".to_string()));
        assert_eq!(apply("phone-pattern", "<p>1234-5678</p>"), None);
    }

    #[test]
    fn test_postal_code_window() {
        let html = "<p>本社</p><p>〒100-0001 東京都千代田区千代田1-1</p>";
        assert_eq!(
            apply("postal-code-window", html),
            Some("本社 〒100-0001 東京都千代田区千代田1-1".to_string())
        );
    }

    #[test]
    fn test_postal_code_window_is_char_bounded() {
        let before = "あ".repeat(60);
        let after = "い".repeat(100);
        let html = format!("<p>{}〒100-0001{}</p>", before, after);
        let address = apply("postal-code-window", &html).unwrap();

        assert_eq!(address.chars().count(), 130);
        assert!(address.starts_with(&"あ".repeat(50)));
    }

    #[test]
    fn test_bare_postal_code_must_stand_alone() {
        assert_eq!(apply("postal-code-window", "<p>TEL 03-1234-5678</p>"), None);
        assert_eq!(
            apply("postal-code-window", "<p>住所 530-0001 大阪市北区</p>"),
            Some("住所 530-0001 大阪市北区".to_string())
        );
    }

    #[test]
    fn test_labelled_address() {
        let html = "<table><tr><th>所在地</th><td>大阪府大阪市北区梅田1-1</td></tr></table>";
        assert_eq!(
            apply("labelled-address", html),
            Some("大阪府大阪市北区梅田1-1".to_string())
        );
    }
}
