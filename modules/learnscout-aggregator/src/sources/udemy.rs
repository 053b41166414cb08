//! Scripted scrape of the Udemy course-search page.
//!
//! Udemy has no usable public search API, so this adapter drives a real
//! headless browser: navigate to a constructed search URL, wait for the
//! result cards to render, and extract fields through per-field selector
//! fallback lists (the site's generated class names rotate between
//! deployments, so every field carries older candidates too).

use async_trait::async_trait;
use browser_session::{PageRequest, SessionManager};
use scraper::Html;
use tracing::info;
use url::Url;

use learnscout_common::{Resource, SourceKind};

use crate::error::{Result, SourceError};
use crate::extract::{absolutize, any_of, first_match, select_cards, FieldSpec};
use crate::sources::SourceAdapter;

const BASE_URL: &str = "https://www.udemy.com";
const MAX_CARDS: usize = 10;
/// Cards rated below this are discarded, matching the search filter.
const MIN_RATING: f64 = 4.5;

/// Result-card container candidates, newest deployment first.
const CARD_SELECTORS: &[&str] = &[
    ".vertical-card-module--primary-top---MLV-",
    ".course-card-module--container--3oS-F",
    "[data-purpose='course-card-container']",
    ".course-card",
];

const TITLE: FieldSpec = FieldSpec {
    name: "title",
    selectors: &[
        ".card-title-module--title--bv1rZ a",
        ".card-title-module--clipped--DPJnT",
        ".course-card-title-module--title--W49Ap",
        ".ud-heading-lg a",
    ],
    attr: None,
};

const LINK: FieldSpec = FieldSpec {
    name: "link",
    selectors: &[".card-title-module--title--bv1rZ a", ".ud-heading-lg a", "h3 a"],
    attr: Some("href"),
};

const DESCRIPTION: FieldSpec = FieldSpec {
    name: "description",
    selectors: &[
        "[data-purpose='safely-set-inner-html:course-card:course-headline']",
        ".card-description-module--description--5tzNB span",
        ".course-card-module--course-headline--v-7gj",
    ],
    attr: None,
};

const RATING: FieldSpec = FieldSpec {
    name: "rating",
    selectors: &[
        ".star-rating-module--rating-number--2-qA2",
        "[data-purpose='rating-number']",
    ],
    attr: None,
};

const IMAGE: FieldSpec = FieldSpec {
    name: "image",
    selectors: &[
        ".card-media-image-module--image---SB4-",
        ".course-card-image-module--image--dfkFe",
        "img",
    ],
    attr: Some("src"),
};

pub struct UdemyAdapter {
    sessions: SessionManager,
}

impl UdemyAdapter {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

fn search_url(query: &str) -> String {
    let mut url = Url::parse(BASE_URL).expect("valid base URL");
    url.set_path("/courses/search/");
    url.query_pairs_mut()
        .append_pair("price", "price-free")
        .append_pair("q", query)
        .append_pair("ratings", "4.5")
        .append_pair("sort", "relevance")
        .append_pair("src", "ukw");
    url.to_string()
}

/// Extract course records from a rendered search page. Cards missing a title
/// or link, or rated below [`MIN_RATING`], are discarded rather than returned
/// partial.
fn extract_courses(query: &str, page_url: &str, html: &str) -> Result<Vec<Resource>> {
    let document = Html::parse_document(html);
    let cards = select_cards(&document, CARD_SELECTORS, MAX_CARDS);
    if cards.is_empty() {
        return Err(SourceError::SelectorExhaustion {
            url: page_url.to_string(),
        });
    }

    let mut resources = Vec::new();
    for card in cards {
        let Some(title) = first_match(card, &TITLE) else {
            continue;
        };
        let rating = first_match(card, &RATING)
            .and_then(|text| text.parse::<f64>().ok())
            .unwrap_or(0.0);
        if rating < MIN_RATING {
            continue;
        }
        let Some(link) = first_match(card, &LINK) else {
            continue;
        };

        let mut resource =
            Resource::new(query, &title, &absolutize(BASE_URL, &link)).with_extra("rating", rating);
        resource.description = first_match(card, &DESCRIPTION);
        resource.thumbnail_url = first_match(card, &IMAGE);
        resources.push(resource);
    }

    Ok(resources)
}

#[async_trait]
impl SourceAdapter for UdemyAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Udemy
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

        let resources = extract_courses(query, &page.final_url, &page.html)?;
        info!(query, count = resources.len(), "Udemy scrape complete");
        Ok(resources)
    }
}
