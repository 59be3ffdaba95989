// Listing-site collectors and the scraper that fans a query out across them.

pub mod glassdoor;
pub mod indeed;
pub mod linkedin;
pub mod runner;
pub mod session;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use scraper::{ElementRef, Html, Selector};

use crate::collectors::session::BrowserSession;
use crate::error::AppError;
use crate::models::job::{JobPosting, JobSource, SearchQuery};

/// Characters that encodeURIComponent does NOT encode.
/// RFC 3986 unreserved: A-Z a-z 0-9 - _ . ! ~ * ' ( )
const ENCODE_URI_COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Trait that all job collectors must implement.
/// Each collector turns a search query into postings from one listing site.
#[async_trait]
pub trait JobCollector: Send + Sync {
    fn source(&self) -> JobSource;

    /// Fetch at most `limit` postings. Unparseable listings are skipped; an error
    /// means the site could not be reached at all.
    async fn collect(
        &self,
        session: &dyn BrowserSession,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<JobPosting>, AppError>;
}

/// A site whose search results are a static page of listing cards.
pub(crate) trait ListingSite: JobCollector {
    /// Origin that relative links on the results page resolve against.
    fn base_url(&self) -> &'static str;

    fn search_url(&self, query: &SearchQuery) -> String;

    fn card_selector(&self) -> &Selector;

    /// Pull one posting out of a listing card.
    fn extract(&self, card: ElementRef<'_>) -> Result<JobPosting, AppError>;
}

/// Navigate to the site's results page and extract up to `limit` cards.
pub(crate) async fn scrape_listings<S: ListingSite>(
    site: &S,
    session: &dyn BrowserSession,
    query: &SearchQuery,
    limit: usize,
) -> Result<Vec<JobPosting>, AppError> {
    let url = site.search_url(query);
    tracing::debug!(source = %site.source(), %url, "Fetching search results");

    let html = session
        .navigate(&url)
        .await
        .map_err(|e| AppError::source_unavailable(site.source().as_str(), e))?;

    Ok(parse_listings(site, &html, limit))
}

/// Extract postings from a results page. A card that fails is logged and skipped.
pub(crate) fn parse_listings<S: ListingSite>(site: &S, html: &str, limit: usize) -> Vec<JobPosting> {
    let document = Html::parse_document(html);
    let mut jobs = Vec::new();

    for card in document.select(site.card_selector()).take(limit) {
        match site.extract(card) {
            Ok(job) => jobs.push(job),
            Err(e) => {
                tracing::debug!(source = %site.source(), "Skipping listing: {e}");
            }
        }
    }

    jobs
}

/// Registry of collectors keyed by source, built once at startup.
#[derive(Clone, Default)]
pub struct CollectorRegistry {
    collectors: HashMap<JobSource, Arc<dyn JobCollector>>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in collector.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(indeed::Indeed::new()));
        registry.register(Arc::new(linkedin::LinkedIn::new()));
        registry.register(Arc::new(glassdoor::Glassdoor::new()));
        registry
    }

    /// Add a collector, replacing any earlier one for the same source.
    pub fn register(&mut self, collector: Arc<dyn JobCollector>) {
        self.collectors.insert(collector.source(), collector);
    }

    pub fn get(&self, source: JobSource) -> Option<Arc<dyn JobCollector>> {
        self.collectors.get(&source).cloned()
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// Encode a search term for a query string, joining words with `space`.
pub(crate) fn query_component(value: &str, space: &str) -> String {
    value
        .split_whitespace()
        .map(|word| utf8_percent_encode(word, ENCODE_URI_COMPONENT_SET).to_string())
        .collect::<Vec<_>>()
        .join(space)
}

/// Trimmed, whitespace-collapsed text of the first match, if non-empty.
pub(crate) fn select_text(card: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    let el = card.select(sel).next()?;
    let text = el.text().collect::<Vec<_>>().join(" ");
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Attribute of the first match, or of the card itself when it matches.
pub(crate) fn select_attr(card: &ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    let own = sel
        .matches(card)
        .then(|| card.value().attr(attr))
        .flatten();
    own.or_else(|| card.select(sel).find_map(|el| el.value().attr(attr)))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve `href` against `base`, keeping only http(s) URLs.
pub(crate) fn resolve_url(base: &str, href: &str) -> Option<String> {
    let base = url::Url::parse(base).ok()?;
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

pub(crate) fn required(value: Option<String>, field: &'static str) -> Result<String, AppError> {
    value.ok_or(AppError::ExtractionIncomplete(field))
}

/// Remote flag inferred from the location text; unknown unless it says remote.
pub(crate) fn remote_hint(location: &str) -> Option<bool> {
    location.to_lowercase().contains("remote").then_some(true)
}

pub(crate) static JOB_DESCRIPTION: LazyLock<Selector> =
    LazyLock::new(|| selector(".job-description"));
pub(crate) static JOB_REQUIREMENTS: LazyLock<Selector> =
    LazyLock::new(|| selector(".job-requirements li"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_component_encodes_words() {
        assert_eq!(query_component("rust  backend", "+"), "rust+backend");
        assert_eq!(query_component("C++ dev", "%20"), "C%2B%2B%20dev");
        assert_eq!(query_component("São Paulo", "+"), "S%C3%A3o+Paulo");
    }

    #[test]
    fn resolve_url_handles_relative_and_rejects_other_schemes() {
        assert_eq!(
            resolve_url("https://www.indeed.com", "/viewjob?jk=abc").as_deref(),
            Some("https://www.indeed.com/viewjob?jk=abc")
        );
        assert_eq!(
            resolve_url("https://www.indeed.com", "https://other.example/x").as_deref(),
            Some("https://other.example/x")
        );
        assert!(resolve_url("https://www.indeed.com", "javascript:void(0)").is_none());
    }

    #[test]
    fn remote_hint_only_claims_remote() {
        assert_eq!(remote_hint("Remote, US"), Some(true));
        assert_eq!(remote_hint("Austin, TX"), None);
    }

    #[test]
    fn default_registry_covers_every_source() {
        let registry = CollectorRegistry::with_defaults();
        assert_eq!(registry.len(), JobSource::ALL.len());
        for source in JobSource::ALL {
            assert_eq!(registry.get(source).map(|c| c.source()), Some(source));
        }
    }
}
