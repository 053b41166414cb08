//! Selector-fallback extraction from rendered DOMs.
//!
//! Scraped sites regenerate their CSS class names between deployments, so no
//! single selector stays valid for long. Each field is described by an ordered
//! candidate list; lookup tries candidates in priority order and takes the
//! first non-empty hit. A miss leaves the field empty rather than failing the
//! record.

use scraper::{ElementRef, Html, Selector};

/// One field of a result card: where to look, in priority order, and whether
/// to read an attribute instead of text content.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub selectors: &'static [&'static str],
    pub attr: Option<&'static str>,
}

/// First non-empty value for `spec` within `scope`. Candidates that fail to
/// parse or match nothing are skipped.
pub fn first_match(scope: ElementRef<'_>, spec: &FieldSpec) -> Option<String> {
    for raw in spec.selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        for element in scope.select(&selector) {
            let value = match spec.attr {
                Some(attr) => element.value().attr(attr).map(str::to_string),
                None => Some(element.text().collect::<String>()),
            };
            if let Some(value) = value {
                let value = value.trim().to_string();
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// Result cards from the document: the first card-selector candidate that
/// matches anything wins, capped at `limit`. Empty when every candidate
/// misses.
pub fn select_cards<'a>(
    document: &'a Html,
    candidates: &[&str],
    limit: usize,
) -> Vec<ElementRef<'a>> {
    for raw in candidates {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let cards: Vec<ElementRef<'a>> = document.select(&selector).take(limit).collect();
        if !cards.is_empty() {
            return cards;
        }
    }
    Vec::new()
}

/// CSS selector list matching any of the candidates, for use as a rendered-
/// content wait condition.
pub fn any_of(candidates: &[&str]) -> String {
    candidates.join(", ")
}

/// Resolve a possibly-relative href against the site origin.
pub fn absolutize(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    match url::Url::parse(base).and_then(|b| b.join(href)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE: FieldSpec = FieldSpec {
        name: "title",
        selectors: &[".primary-title", ".secondary-title", "h3 a"],
        attr: None,
    };

    const LINK: FieldSpec = FieldSpec {
        name: "link",
        selectors: &["h3 a", "a"],
        attr: Some("href"),
    };

    fn card(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    fn root(doc: &Html) -> ElementRef<'_> {
        doc.root_element()
    }

    #[test]
    fn primary_selector_wins_when_present() {
        let doc = card(r#"<div><span class="primary-title">First</span><span class="secondary-title">Second</span></div>"#);
        assert_eq!(first_match(root(&doc), &TITLE).as_deref(), Some("First"));
    }

    #[test]
    fn falls_back_to_secondary_selector() {
        let doc = card(r#"<div><span class="secondary-title">Fallback Title</span></div>"#);
        assert_eq!(
            first_match(root(&doc), &TITLE).as_deref(),
            Some("Fallback Title")
        );
    }

    #[test]
    fn empty_text_is_treated_as_a_miss() {
        let doc = card(r#"<div><span class="primary-title">  </span><span class="secondary-title">Real</span></div>"#);
        assert_eq!(first_match(root(&doc), &TITLE).as_deref(), Some("Real"));
    }

    #[test]
    fn missing_field_yields_none_not_failure() {
        let doc = card(r#"<div><p>no titles here</p></div>"#);
        assert_eq!(first_match(root(&doc), &TITLE), None);
    }

    #[test]
    fn attribute_extraction_reads_href() {
        let doc = card(r#"<div><h3><a href="/course/rust-101">Rust 101</a></h3></div>"#);
        assert_eq!(
            first_match(root(&doc), &LINK).as_deref(),
            Some("/course/rust-101")
        );
    }

    #[test]
    fn select_cards_uses_first_matching_candidate() {
        let html = r#"<html><body>
            <div class="new-card">a</div>
            <div class="new-card">b</div>
            <div class="old-card">c</div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let cards = select_cards(&doc, &[".missing-card", ".new-card", ".old-card"], 10);
        assert_eq!(cards.len(), 2);
    }

    #[test]
    fn select_cards_respects_limit() {
        let html = r#"<html><body>
            <div class="c">1</div><div class="c">2</div><div class="c">3</div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(select_cards(&doc, &[".c"], 2).len(), 2);
    }

    #[test]
    fn absolutize_joins_relative_links() {
        assert_eq!(
            absolutize("https://www.udemy.com", "/course/x/"),
            "https://www.udemy.com/course/x/"
        );
        assert_eq!(
            absolutize("https://www.udemy.com", "https://other.com/y"),
            "https://other.com/y"
        );
    }

    #[test]
    fn any_of_builds_a_selector_list() {
        assert_eq!(any_of(&[".a", ".b"]), ".a, .b");
    }
}
