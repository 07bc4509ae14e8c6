use async_trait::async_trait;

use crate::types::{Article, InsertSummary};
use crate::Result;

/// Predicate used by [`ArticleStore::delete_matching`].
pub type ArticlePredicate<'a> = &'a (dyn Fn(&Article) -> bool + Send + Sync);

/// Persistent article collection deduplicated on (title, text).
///
/// "Oldest" throughout means: articles without a publish date first, then by
/// ascending publish date, ties broken by insertion order.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Inserts as many articles as possible. Articles whose (title, text) pair
    /// is already stored, or repeated earlier in the same batch, are skipped and
    /// counted as duplicates. Uniqueness must be checked atomically with the write.
    async fn bulk_insert(&self, articles: &[Article]) -> Result<InsertSummary>;

    /// Deletes the oldest articles until at most `max_count` remain.
    async fn evict_to_capacity(&self, max_count: usize) -> Result<usize>;

    /// Deletes the `n` oldest articles, or all of them if fewer are stored.
    async fn delete_oldest(&self, n: usize) -> Result<usize>;

    /// Relevance-ranked full-text search over title and text.
    async fn search(&self, keyword: &str) -> Result<Vec<Article>>;

    /// All articles, newest publish date first, undated articles last.
    async fn list_all(&self) -> Result<Vec<Article>>;

    /// Deletes every article matching the predicate.
    async fn delete_matching(&self, predicate: ArticlePredicate<'_>) -> Result<usize>;

    async fn count(&self) -> Result<usize>;
}

/// Splits a search keyword into lowercase terms.
pub fn search_terms(keyword: &str) -> Vec<String> {
    keyword
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}
