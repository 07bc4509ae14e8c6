use std::sync::Arc;

use futures::stream::{self, StreamExt};
use nb_core::config::IngestConfig;
use nb_core::{ArticleStore, Error, RawArticle, Result, SiteScraper};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::junk::JunkFilter;
use crate::logging::Logger;
use crate::normalize::normalize;

/// One ingestion request: which sites to scrape and how many articles per site.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub websites: Vec<String>,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub added: usize,
    pub duplicates_skipped: usize,
    pub rejected: usize,
    pub junk: usize,
    pub purged: usize,
    pub evicted: usize,
    pub failed_sites: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Completed(IngestReport),
    /// Nothing survived normalization and filtering; the store was not touched.
    NoValidResults,
}

/// Runs the scrape → normalize → filter → insert → purge → evict pipeline.
pub struct IngestionManager {
    store: Arc<dyn ArticleStore>,
    scraper: Arc<dyn SiteScraper>,
    junk: JunkFilter,
    config: IngestConfig,
}

impl IngestionManager {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        scraper: Arc<dyn SiteScraper>,
        junk: JunkFilter,
        config: IngestConfig,
    ) -> Self {
        Self {
            store,
            scraper,
            junk,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn ArticleStore> {
        &self.store
    }

    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome> {
        let websites: Vec<String> = request
            .websites
            .iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        if websites.is_empty() {
            return Err(Error::InvalidRequest("No websites provided".to_string()));
        }
        let count = request.count.unwrap_or(self.config.default_count);
        if count == 0 {
            return Err(Error::InvalidRequest("count must be at least 1".to_string()));
        }

        info!("🦗 Scraping {} websites ({} articles each)", websites.len(), count);
        let (raw_articles, failed_sites) = self.scrape_sites(websites, count).await;

        let mut report = IngestReport {
            failed_sites,
            ..IngestReport::default()
        };
        let mut valid = Vec::with_capacity(raw_articles.len());
        for raw in raw_articles {
            match normalize(raw) {
                Ok(article) if self.junk.is_junk(&article) => report.junk += 1,
                Ok(article) => valid.push(article),
                Err(e) => {
                    debug!("Dropping article: {}", e);
                    report.rejected += 1;
                }
            }
        }

        if valid.is_empty() {
            info!(
                rejected = report.rejected,
                junk = report.junk,
                failed_sites = report.failed_sites,
                "No valid articles to store"
            );
            return Ok(IngestOutcome::NoValidResults);
        }

        let summary = self.store.bulk_insert(&valid).await?;
        report.added = summary.added;
        report.duplicates_skipped = summary.duplicates;

        report.purged = self.junk.purge(self.store.as_ref()).await?;
        report.evicted = self.store.evict_to_capacity(self.config.max_articles).await?;

        info!(
            added = report.added,
            duplicates_skipped = report.duplicates_skipped,
            rejected = report.rejected,
            junk = report.junk,
            purged = report.purged,
            evicted = report.evicted,
            failed_sites = report.failed_sites,
            "✅ Ingestion completed"
        );
        Ok(IngestOutcome::Completed(report))
    }

    pub async fn delete_oldest(&self, n: usize) -> Result<usize> {
        let deleted = self.store.delete_oldest(n).await?;
        info!("🗑️ Deleted {} oldest articles", deleted);
        Ok(deleted)
    }

    /// Scrapes every site with bounded concurrency. A site that fails or exceeds
    /// the per-site timeout contributes nothing and is counted as failed.
    async fn scrape_sites(&self, websites: Vec<String>, count: usize) -> (Vec<RawArticle>, usize) {
        let timeout = self.config.site_timeout();
        let results: Vec<(Logger, Result<Vec<RawArticle>>)> = stream::iter(websites)
            .map(|site| {
                let scraper = self.scraper.clone();
                async move {
                    let logger = Logger::new().with_prefix(format!("[{}]", site));
                    let result = match tokio::time::timeout(timeout, scraper.scrape(&site, count)).await {
                        Ok(result) => result,
                        Err(_) => Err(Error::Scraping(format!("timed out after {:?}", timeout))),
                    };
                    (logger, result)
                }
            })
            .buffer_unordered(self.config.max_concurrent_sites.max(1))
            .collect()
            .await;

        let mut articles = Vec::new();
        let mut failed = 0;
        for (logger, result) in results {
            match result {
                Ok(mut scraped) => {
                    logger.info(&format!("Links scraped: {}", scraped.len()));
                    articles.append(&mut scraped);
                }
                Err(e) => {
                    logger.warn(&format!("Failed to process website. Error: {}", e));
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            warn!("{} websites failed", failed);
        }
        (articles, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nb_core::config::JunkFilterConfig;
    use nb_core::storage::ArticlePredicate;
    use nb_core::{Article, InsertSummary};
    use nb_storage::InMemoryStorage;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Clone)]
    enum Site {
        Articles(Vec<RawArticle>),
        Fails,
        Hangs,
    }

    #[derive(Default)]
    struct MockScraper {
        sites: HashMap<String, Site>,
    }

    impl MockScraper {
        fn with(mut self, url: &str, site: Site) -> Self {
            self.sites.insert(url.to_string(), site);
            self
        }
    }

    #[async_trait]
    impl SiteScraper for MockScraper {
        async fn scrape(&self, url: &str, _max_count: usize) -> Result<Vec<RawArticle>> {
            match self.sites.get(url) {
                Some(Site::Articles(articles)) => Ok(articles.clone()),
                Some(Site::Hangs) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Vec::new())
                }
                Some(Site::Fails) | None => Err(Error::Scraping(format!("cannot reach {}", url))),
            }
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl ArticleStore for BrokenStore {
        async fn bulk_insert(&self, _articles: &[Article]) -> Result<InsertSummary> {
            Err(Error::Storage("connection refused".to_string()))
        }

        async fn evict_to_capacity(&self, _max_count: usize) -> Result<usize> {
            Ok(0)
        }

        async fn delete_oldest(&self, _n: usize) -> Result<usize> {
            Ok(0)
        }

        async fn search(&self, _keyword: &str) -> Result<Vec<Article>> {
            Ok(Vec::new())
        }

        async fn list_all(&self) -> Result<Vec<Article>> {
            Ok(Vec::new())
        }

        async fn delete_matching(&self, _predicate: ArticlePredicate<'_>) -> Result<usize> {
            Ok(0)
        }

        async fn count(&self) -> Result<usize> {
            Ok(0)
        }
    }

    fn raw(title: &str, text: Option<&str>, date: Option<&str>) -> RawArticle {
        RawArticle {
            link: Some(format!("http://a/{}", title)),
            title: Some(title.to_string()),
            text: text.map(String::from),
            publish_date: date.map(String::from),
            ..RawArticle::default()
        }
    }

    fn manager(store: Arc<dyn ArticleStore>, scraper: MockScraper, config: IngestConfig) -> IngestionManager {
        let junk = JunkFilter::new(&JunkFilterConfig::default()).unwrap();
        IngestionManager::new(store, Arc::new(scraper), junk, config)
    }

    fn request(websites: &[&str], count: usize) -> IngestRequest {
        IngestRequest {
            websites: websites.iter().map(|w| w.to_string()).collect(),
            count: Some(count),
        }
    }

    fn completed(outcome: IngestOutcome) -> IngestReport {
        match outcome {
            IngestOutcome::Completed(report) => report,
            IngestOutcome::NoValidResults => panic!("expected a completed ingestion"),
        }
    }

    #[tokio::test]
    async fn test_ingest_then_reingest() {
        let store = Arc::new(InMemoryStorage::new());
        let scraper = MockScraper::default().with(
            "http://a",
            Site::Articles(vec![
                raw("one", Some("first body"), Some("2024-01-01")),
                raw("two", None, None),
                raw("three", Some("third body"), None),
            ]),
        );
        let manager = manager(store.clone(), scraper, IngestConfig::default());

        let report = completed(manager.ingest(request(&["http://a"], 2)).await.unwrap());
        assert_eq!(report.added, 2);
        assert_eq!(report.duplicates_skipped, 0);
        assert_eq!(report.rejected, 1);
        assert_eq!(store.count().await.unwrap(), 2);

        let report = completed(manager.ingest(request(&["http://a"], 2)).await.unwrap());
        assert_eq!(report.added, 0);
        assert_eq!(report.duplicates_skipped, 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let manager = manager(Arc::new(InMemoryStorage::new()), MockScraper::default(), IngestConfig::default());

        let err = manager.ingest(request(&[], 5)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        let err = manager.ingest(request(&["  "], 5)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        let err = manager.ingest(request(&["http://a"], 0)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_no_valid_results() {
        let store = Arc::new(InMemoryStorage::new());
        let scraper = MockScraper::default().with(
            "http://a",
            Site::Articles(vec![
                raw("no body", None, None),
                raw("gallery", Some("No description available."), None),
            ]),
        );
        let manager = manager(store.clone(), scraper, IngestConfig::default());

        let outcome = manager.ingest(request(&["http://a", "http://down"], 10)).await.unwrap();
        assert_eq!(outcome, IngestOutcome::NoValidResults);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failing_sites_are_isolated() {
        let store = Arc::new(InMemoryStorage::new());
        let scraper = MockScraper::default()
            .with("http://down", Site::Fails)
            .with("http://ok", Site::Articles(vec![raw("story", Some("body"), None)]))
            .with("http://slow", Site::Hangs);
        let config = IngestConfig {
            site_timeout_secs: 1,
            ..IngestConfig::default()
        };
        let manager = manager(store.clone(), scraper, config);

        let report = completed(
            manager
                .ingest(request(&["http://down", "http://slow", "http://ok"], 5))
                .await
                .unwrap(),
        );
        assert_eq!(report.added, 1);
        assert_eq!(report.failed_sites, 2);
    }

    #[tokio::test]
    async fn test_junk_is_filtered_before_insert() {
        let store = Arc::new(InMemoryStorage::new());
        let scraper = MockScraper::default().with(
            "http://a",
            Site::Articles(vec![
                raw("Lenovo announces", Some("press release"), None),
                raw("Real story", Some("No description available."), None),
                raw("Another story", Some("actual reporting"), None),
            ]),
        );
        let manager = manager(store.clone(), scraper, IngestConfig::default());

        let report = completed(manager.ingest(request(&["http://a"], 10)).await.unwrap());
        assert_eq!(report.added, 1);
        assert_eq!(report.junk, 2);
        let stored = store.list_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Another story");
    }

    #[tokio::test]
    async fn test_purge_sweeps_preexisting_junk() {
        let store = Arc::new(InMemoryStorage::new());
        store
            .bulk_insert(&[Article::new("", "Old gallery", "No description available.")])
            .await
            .unwrap();
        let scraper = MockScraper::default()
            .with("http://a", Site::Articles(vec![raw("story", Some("body"), None)]));
        let manager = manager(store.clone(), scraper, IngestConfig::default());

        let report = completed(manager.ingest(request(&["http://a"], 10)).await.unwrap());
        assert_eq!(report.purged, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let store = Arc::new(InMemoryStorage::new());
        let articles = vec![
            raw("jan", Some("january"), Some("2024-01-15")),
            raw("undated", Some("no date"), None),
            raw("mar", Some("march"), Some("2024-03-15")),
            raw("feb", Some("february"), Some("2024-02-15")),
        ];
        let scraper = MockScraper::default().with("http://a", Site::Articles(articles));
        let config = IngestConfig {
            max_articles: 2,
            ..IngestConfig::default()
        };
        let manager = manager(store.clone(), scraper, config);

        let report = completed(manager.ingest(request(&["http://a"], 10)).await.unwrap());
        assert_eq!(report.added, 4);
        assert_eq!(report.evicted, 2);

        let titles: Vec<String> = store.list_all().await.unwrap().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["mar", "feb"]);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let scraper = MockScraper::default()
            .with("http://a", Site::Articles(vec![raw("story", Some("body"), None)]));
        let manager = manager(Arc::new(BrokenStore), scraper, IngestConfig::default());

        let err = manager.ingest(request(&["http://a"], 10)).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_default_count_and_delete_oldest() {
        let store = Arc::new(InMemoryStorage::new());
        let scraper = MockScraper::default().with(
            "http://a",
            Site::Articles(vec![
                raw("old", Some("old body"), Some("2020-01-01")),
                raw("new", Some("new body"), Some("2024-01-01")),
            ]),
        );
        let manager = manager(store.clone(), scraper, IngestConfig::default());

        let request = IngestRequest {
            websites: vec!["http://a".to_string()],
            count: None,
        };
        completed(manager.ingest(request).await.unwrap());

        assert_eq!(manager.delete_oldest(1).await.unwrap(), 1);
        let remaining = store.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "new");
    }
}
