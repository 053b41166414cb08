//! Scripted scrape of the Medium search page for roadmap-style articles.
//!
//! Same browser-driven approach as the Udemy adapter, with one difference in
//! policy: Medium cards are only kept when every field extracted (title,
//! link, author, description) — a partial blog card is not worth surfacing.

use async_trait::async_trait;
use browser_session::{PageRequest, SessionManager};
use scraper::Html;
use tracing::info;
use url::Url;

use learnscout_common::{Resource, SourceKind};

use crate::error::{Result, SourceError};
use crate::extract::{absolutize, any_of, first_match, select_cards, FieldSpec};
use crate::sources::SourceAdapter;

const BASE_URL: &str = "https://medium.com";
const MAX_CARDS: usize = 10;

/// Result-item container candidates. Medium's obfuscated utility classes
/// rotate often; the structural candidates are the safety net.
const CARD_SELECTORS: &[&str] = &[".bh.l", "[data-testid='post-preview']", "article"];

const TITLE: FieldSpec = FieldSpec {
    name: "title",
    selectors: &["h2"],
    attr: None,
};

const DESCRIPTION: FieldSpec = FieldSpec {
    name: "description",
    selectors: &["h3"],
    attr: None,
};

const AUTHOR: FieldSpec = FieldSpec {
    name: "author",
    selectors: &[
        "a[rel='noopener follow'] p",
        "[data-testid='authorName']",
    ],
    attr: None,
};

const LINK: FieldSpec = FieldSpec {
    name: "link",
    selectors: &["a[href^='/@']", "a[href*='medium.com/@']", "h2 a"],
    attr: Some("href"),
};

pub struct MediumAdapter {
    sessions: SessionManager,
}

impl MediumAdapter {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

fn search_url(query: &str) -> String {
    let mut url = Url::parse(BASE_URL).expect("valid base URL");
    url.set_path("/search");
    // The roadmap qualifier biases results toward structured learning posts.
    url.query_pairs_mut()
        .append_pair("q", &format!("{query} roadmap"));
    url.to_string()
}

/// Extract blog posts from a rendered search page. Only complete cards are
/// kept.
fn extract_posts(query: &str, page_url: &str, html: &str) -> Result<Vec<Resource>> {
    let document = Html::parse_document(html);
    let cards = select_cards(&document, CARD_SELECTORS, MAX_CARDS);
    if cards.is_empty() {
        return Err(SourceError::SelectorExhaustion {
            url: page_url.to_string(),
        });
    }

    let mut resources = Vec::new();
    for card in cards {
        let (Some(title), Some(link), Some(author), Some(description)) = (
            first_match(card, &TITLE),
            first_match(card, &LINK),
            first_match(card, &AUTHOR),
            first_match(card, &DESCRIPTION),
        ) else {
            continue;
        };

        let mut resource =
            Resource::new(query, &title, &absolutize(BASE_URL, &link)).with_extra("author", author);
        resource.description = Some(description);
        resources.push(resource);
    }

    Ok(resources)
}

#[async_trait]
impl SourceAdapter for MediumAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Medium
    }

    fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(24)
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Resource>> {
        let request = PageRequest::new(search_url(query)).wait_for(any_of(CARD_SELECTORS));

        let page = self
            .sessions
            .with_session(|browser| Box::pin(async move { browser.goto(&request).await }))
            .await?;

        let resources = extract_posts(query, &page.final_url, &page.html)?;
        info!(query, count = resources.len(), "Medium scrape complete");
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser_session::testing::ScriptedLauncher;
    use std::sync::Arc;

    fn post_card(title: &str, author: &str, link: &str) -> String {
        format!(
            r#"<div class="bh l">
                <a rel="noopener follow" href="{link}"><p>{author}</p></a>
                <h2>{title}</h2>
                <h3>A summary of {title}</h3>
            </div>"#
        )
    }

    #[test]
    fn search_url_appends_roadmap_qualifier() {
        let url = search_url("kubernetes");
        assert_eq!(url, "https://medium.com/search?q=kubernetes+roadmap");
    }

    #[test]
    fn complete_cards_are_extracted() {
        let html = format!(
            "<html><body>{}</body></html>",
            post_card("Learn Rust in 2026", "ferris", "/@ferris/learn-rust")
        );

        let posts = extract_posts("rust", "https://medium.com/search", &html).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Learn Rust in 2026");
        assert_eq!(posts[0].link, "https://medium.com/@ferris/learn-rust");
        assert_eq!(posts[0].extra["author"], "ferris");
    }

    #[test]
    fn incomplete_cards_are_dropped() {
        // Second card has no author anchor, so it must be dropped whole.
        let html = format!(
            r#"<html><body>
                {}
                <div class="bh l"><h2>No Author</h2><h3>desc</h3></div>
            </body></html>"#,
            post_card("Complete", "someone", "/@someone/post")
        );

        let posts = extract_posts("go", "https://medium.com/search", &html).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Complete");
    }

    #[test]
    fn no_result_items_is_selector_exhaustion() {
        let html = "<html><body><main>empty page</main></body></html>";
        let err = extract_posts("go", "https://medium.com/search", html).unwrap_err();
        assert!(matches!(err, SourceError::SelectorExhaustion { .. }));
    }

    #[tokio::test]
    async fn fetch_extracts_through_a_scripted_session() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            post_card("Docker Roadmap", "alex", "/@alex/docker"),
            post_card("K8s Roadmap", "sam", "/@sam/k8s")
        );
        let launcher = ScriptedLauncher::with_html(&html);
        let adapter = MediumAdapter::new(SessionManager::new(Arc::new(launcher)));

        let posts = adapter.fetch("docker").await.unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.source_query == "docker"));
    }
}
