use async_trait::async_trait;

use crate::types::{Bias, RawArticle};
use crate::Result;

#[async_trait]
pub trait BiasClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Predict the political leaning of a piece of text
    async fn predict(&self, text: &str) -> Result<Bias>;
}

/// Joins a title and a text into one classifier input, skipping blank parts.
/// Returns `None` when there is nothing to classify.
pub fn classifier_input(title: Option<&str>, text: &str) -> Option<String> {
    let parts: Vec<&str> = [title.unwrap_or(""), text]
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

#[async_trait]
pub trait SiteScraper: Send + Sync {
    /// Scrapes up to `max_count` articles from the site at `url`.
    ///
    /// Failures on individual articles are logged and skipped; an error is only
    /// returned when the site itself cannot be processed.
    async fn scrape(&self, url: &str, max_count: usize) -> Result<Vec<RawArticle>>;
}
