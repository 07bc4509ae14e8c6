use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use nb_core::config::StorageConfig;
use nb_core::storage::{search_terms, ArticlePredicate};
use nb_core::{Article, ArticleStore, Error, InsertSummary, Result};
use tokio::sync::RwLock;

use crate::StorageBackend;

struct StoredArticle {
    seq: u64,
    article: Article,
}

fn owned_key(article: &Article) -> (String, String) {
    let (title, text) = article.dedup_key();
    (title.to_string(), text.to_string())
}

/// Articles plus the set of (title, text) keys, always mutated together.
#[derive(Default)]
struct MemoryStore {
    articles: Vec<StoredArticle>,
    keys: HashSet<(String, String)>,
    next_seq: u64,
}

impl MemoryStore {
    fn insert(&mut self, article: &Article) -> bool {
        if !self.keys.insert(owned_key(article)) {
            return false;
        }
        self.articles.push(StoredArticle {
            seq: self.next_seq,
            article: article.clone(),
        });
        self.next_seq += 1;
        true
    }

    fn delete_oldest(&mut self, n: usize) -> usize {
        if n == 0 || self.articles.is_empty() {
            return 0;
        }
        // `None < Some(_)`, so undated articles sort first.
        let mut order: Vec<_> = self
            .articles
            .iter()
            .map(|s| (s.article.publish_date, s.seq))
            .collect();
        order.sort();
        let doomed: HashSet<u64> = order.into_iter().take(n).map(|(_, seq)| seq).collect();
        self.remove_where(|s| doomed.contains(&s.seq))
    }

    fn search(&self, terms: &[String]) -> Vec<Article> {
        let mut scored: Vec<(usize, u64, &Article)> = self
            .articles
            .iter()
            .filter_map(|s| {
                let score = relevance(&s.article, terms);
                (score > 0).then_some((score, s.seq, &s.article))
            })
            .collect();
        scored.sort_by_key(|(score, seq, _)| (Reverse(*score), *seq));
        scored.into_iter().map(|(_, _, a)| a.clone()).collect()
    }

    fn list_all(&self) -> Vec<Article> {
        let mut stored: Vec<&StoredArticle> = self.articles.iter().collect();
        stored.sort_by_key(|s| {
            (
                s.article.publish_date.is_none(),
                Reverse(s.article.publish_date),
                Reverse(s.seq),
            )
        });
        stored.into_iter().map(|s| s.article.clone()).collect()
    }

    fn remove_matching(&mut self, predicate: ArticlePredicate<'_>) -> usize {
        self.remove_where(|s| predicate(&s.article))
    }

    fn len(&self) -> usize {
        self.articles.len()
    }

    fn remove_where(&mut self, mut doomed: impl FnMut(&StoredArticle) -> bool) -> usize {
        let before = self.articles.len();
        let mut removed_keys = Vec::new();
        self.articles.retain(|s| {
            if doomed(s) {
                removed_keys.push(owned_key(&s.article));
                false
            } else {
                true
            }
        });
        for key in removed_keys {
            self.keys.remove(&key);
        }
        before - self.articles.len()
    }
}

/// Number of search term occurrences in the article's title and text.
fn relevance(article: &Article, terms: &[String]) -> usize {
    search_terms(&article.title)
        .into_iter()
        .chain(search_terms(&article.text))
        .filter(|word| terms.contains(word))
        .count()
}

/// Process-local store; contents are lost when the process exits.
#[derive(Default, Clone)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn from_config(_config: &StorageConfig) -> Result<Self> {
        Ok(Self::new())
    }
}

#[async_trait]
impl ArticleStore for InMemoryStorage {
    async fn bulk_insert(&self, articles: &[Article]) -> Result<InsertSummary> {
        let mut store = self.store.write().await;
        let mut summary = InsertSummary::default();
        for article in articles {
            if store.insert(article) {
                summary.added += 1;
            } else {
                summary.duplicates += 1;
            }
        }
        Ok(summary)
    }

    async fn evict_to_capacity(&self, max_count: usize) -> Result<usize> {
        let mut store = self.store.write().await;
        let excess = store.len().saturating_sub(max_count);
        Ok(store.delete_oldest(excess))
    }

    async fn delete_oldest(&self, n: usize) -> Result<usize> {
        Ok(self.store.write().await.delete_oldest(n))
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Article>> {
        let terms = search_terms(keyword);
        if terms.is_empty() {
            return Err(Error::InvalidQuery("No keyword provided".to_string()));
        }
        Ok(self.store.read().await.search(&terms))
    }

    async fn list_all(&self) -> Result<Vec<Article>> {
        Ok(self.store.read().await.list_all())
    }

    async fn delete_matching(&self, predicate: ArticlePredicate<'_>) -> Result<usize> {
        Ok(self.store.write().await.remove_matching(predicate))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.store.read().await.len())
    }
}
