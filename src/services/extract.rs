// src/services/extract.rs

//! Outbound link extraction from fetched pages.

use scraper::{Html, Selector};
use url::Url;

use crate::utils::url::{canonicalize, is_fetchable_scheme};

/// Href prefixes that never lead to a fetchable page.
const SKIPPED_SCHEMES: [&str; 5] = ["javascript:", "mailto:", "tel:", "sms:", "whatsapp:"];

/// Extract candidate links from a page.
///
/// Resolves relative and protocol-relative references against `base`, keeps
/// only http/https results, and canonicalizes each before yielding. Malformed
/// markup yields an empty vec, never an error.
pub fn extract_links(base: &Url, html: &str) -> Vec<Url> {
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(resolved) = resolve_href(base, href) {
            links.push(resolved);
        }
    }
    links
}

/// Resolve a single href to a canonical absolute URL, or reject it.
fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim().trim_matches(|c: char| c == '\'' || c == '"');
    if is_skippable(href) {
        return None;
    }

    // Url::join resolves relative and protocol-relative references alike.
    let resolved = base.join(href).ok()?;
    if !is_fetchable_scheme(&resolved) {
        return None;
    }
    Some(canonicalize(&resolved))
}

/// Empty hrefs, in-page fragments, and non-navigable schemes.
fn is_skippable(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return true;
    }
    let lower = href.to_ascii_lowercase();
    SKIPPED_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://a.test/dir/page").unwrap()
    }

    fn links(html: &str) -> Vec<String> {
        extract_links(&base(), html)
            .into_iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn extracts_absolute_and_relative_links() {
        let html = r#"<a href="http://a.test/x">x</a> <a href="sub">s</a> <a href="/root">r</a>"#;
        assert_eq!(
            links(html),
            vec![
                "http://a.test/x".to_string(),
                "http://a.test/dir/sub".to_string(),
                "http://a.test/root".to_string(),
            ]
        );
    }

    #[test]
    fn skips_fragment_only_anchors() {
        let html = r##"<a href="#top">top</a> <a href="http://a.test/b">b</a>"##;
        assert_eq!(links(html), vec!["http://a.test/b".to_string()]);
    }

    #[test]
    fn skips_non_navigable_schemes() {
        let html = concat!(
            r#"<a href="javascript:void(0)">j</a>"#,
            r#"<a href="MAILTO:x@a.test">m</a>"#,
            r#"<a href="tel:+123">t</a>"#,
            r#"<a href="sms:+123">s</a>"#,
            r#"<a href="whatsapp:send">w</a>"#,
        );
        assert!(links(html).is_empty());
    }

    #[test]
    fn skips_empty_and_whitespace_hrefs() {
        let html = r#"<a href="">e</a> <a href="   ">w</a>"#;
        assert!(links(html).is_empty());
    }

    #[test]
    fn resolves_protocol_relative_against_base_scheme() {
        let html = r#"<a href="//b.test/path">p</a>"#;
        assert_eq!(links(html), vec!["http://b.test/path".to_string()]);
    }

    #[test]
    fn drops_non_http_results() {
        let html = r#"<a href="ftp://a.test/file">f</a>"#;
        assert!(links(html).is_empty());
    }

    #[test]
    fn yields_canonical_urls() {
        let html = r#"<a href="http://a.test:80/x/#frag">x</a>"#;
        assert_eq!(links(html), vec!["http://a.test/x".to_string()]);
    }

    #[test]
    fn trims_stray_quotes_around_hrefs() {
        let html = r#"<a href="'http://a.test/q'">q</a>"#;
        assert_eq!(links(html), vec!["http://a.test/q".to_string()]);
    }

    #[test]
    fn malformed_markup_yields_no_links() {
        assert!(links("<<<not html").is_empty());
        assert!(links("").is_empty());
    }
}
