use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use nb_core::{Error, RawArticle, Result, SiteScraper};
use scraper::Html;
use url::Url;

use crate::logging::Logger;

pub mod jsonld;

const USER_AGENT: &str = concat!("nb-scraper/", env!("CARGO_PKG_VERSION"));

/// Scrapes arbitrary news sites: collects article links from the front page,
/// then reads title, body and metadata from each article page.
#[derive(Debug, Clone)]
pub struct WebsiteScraper {
    client: reqwest::Client,
}

impl WebsiteScraper {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SiteScraper for WebsiteScraper {
    async fn scrape(&self, url: &str, max_count: usize) -> Result<Vec<RawArticle>> {
        let logger = Logger::new().with_prefix(format!("[{}]", url));
        let base = utils::parse_url(url)?;
        let front_page = self.fetch(&base).await?;
        let links = utils::article_links(&front_page, &base);
        logger.info(&format!("🔗 Found {} candidate links", links.len()));

        let mut articles = Vec::new();
        for link in links {
            if articles.len() >= max_count {
                break;
            }
            match self.fetch(&link).await {
                Ok(html) => match parse_article(&html, link.as_str()) {
                    Some(article) => articles.push(article),
                    None => logger.debug(&format!("Skipping {}: no article content", link)),
                },
                Err(e) => logger.warn(&format!("Failed to parse article: {}. Error: {}", link, e)),
            }
        }

        logger.info(&format!("📰 Scraped {} articles", articles.len()));
        Ok(articles)
    }
}

/// Reads an article page. Returns `None` when the page has neither a title nor body text.
pub fn parse_article(html: &str, link: &str) -> Option<RawArticle> {
    let document = Html::parse_document(html);

    let title = utils::extract_attr(&document, "meta[property='og:title']", "content")
        .or_else(|| utils::extract_text(&document, "h1").ok())
        .or_else(|| utils::extract_text(&document, "title").ok());

    let mut paragraphs = utils::extract_texts(&document, "article p").unwrap_or_default();
    if paragraphs.is_empty() {
        paragraphs = utils::extract_texts(&document, "p").unwrap_or_default();
    }
    let text = paragraphs
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    let text = (!text.is_empty()).then_some(text);

    if title.is_none() && text.is_none() {
        return None;
    }

    let mut author = jsonld::extract_authors(&document);
    if author.is_empty() {
        author.extend(utils::extract_attr(&document, "meta[name='author']", "content"));
    }

    let publish_date = utils::extract_attr(&document, "meta[property='article:published_time']", "content")
        .or_else(|| jsonld::extract_date_published(&document))
        .or_else(|| utils::extract_attr(&document, "time[datetime]", "datetime"));

    let mut keywords: Vec<String> = utils::extract_attr(&document, "meta[name='keywords']", "content")
        .map(|k| k.split(',').map(|s| s.trim().to_string()).collect())
        .unwrap_or_default();
    keywords.extend(jsonld::extract_keywords(&document));

    Some(RawArticle {
        link: Some(link.to_string()),
        title,
        text,
        author,
        publish_date,
        keywords,
        tags: utils::extract_attrs(&document, "meta[property='article:tag']", "content"),
        thumbnail: utils::extract_attr(&document, "meta[property='og:image']", "content"),
    })
}

/// Common utilities for scrapers
pub mod utils {
    use super::*;
    use scraper::Selector;

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::Scraping(format!("Failed to parse URL: {}", e)))
    }

    pub fn extract_text(document: &Html, selector: &str) -> Result<String> {
        let selector = Selector::parse(selector)
            .map_err(|e| Error::Scraping(format!("Invalid selector: {}", e)))?;

        document
            .select(&selector)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .find(|text| !text.is_empty())
            .ok_or_else(|| Error::Scraping(format!("No element found for selector: {:?}", selector)))
    }

    pub fn extract_texts(document: &Html, selector: &str) -> Result<Vec<String>> {
        let selector = Selector::parse(selector)
            .map_err(|e| Error::Scraping(format!("Invalid selector: {}", e)))?;

        Ok(document
            .select(&selector)
            .map(|el| el.text().collect::<String>())
            .collect())
    }

    /// First non-blank value of `attr` on elements matching `selector`.
    pub fn extract_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
        extract_attrs(document, selector, attr).into_iter().next()
    }

    pub fn extract_attrs(document: &Html, selector: &str, attr: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }

    /// Same-site links on `base`'s page that look like articles, in page order.
    pub fn article_links(html: &str, base: &Url) -> Vec<Url> {
        let document = Html::parse_document(html);
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| base.join(href).ok())
            .map(|mut url| {
                url.set_fragment(None);
                url
            })
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .filter(|url| same_site(url, base) && url.path() != base.path())
            .filter(looks_like_article)
            .filter(|url| seen.insert(page_key(url)))
            .collect()
    }

    fn bare_host(url: &Url) -> Option<&str> {
        url.host_str().map(|host| host.trim_start_matches("www."))
    }

    fn same_site(url: &Url, base: &Url) -> bool {
        bare_host(url).is_some() && bare_host(url) == bare_host(base)
    }

    /// `www.` and non-`www.` spellings of a page are the same page.
    fn page_key(url: &Url) -> String {
        format!(
            "{}{}?{}",
            bare_host(url).unwrap_or_default(),
            url.path(),
            url.query().unwrap_or_default()
        )
    }

    fn looks_like_article(url: &Url) -> bool {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        segments.len() >= 2 || segments.last().is_some_and(|last| last.contains('-'))
    }
}
