//! Behaviour every `ArticleStore` backend must share.

use std::sync::Arc;

use chrono::NaiveDate;
use nb_core::{Article, ArticleStore, Error};

pub fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

pub fn article(title: &str, text: &str, publish_date: Option<NaiveDate>) -> Article {
    Article::new(format!("http://news.test/{}", title.replace(' ', "-")), title, text)
        .with_publish_date(publish_date)
}

pub async fn run_store_suite(store: Arc<dyn ArticleStore>) {
    check_bulk_insert_counts(store.as_ref()).await;
    store.delete_oldest(usize::MAX).await.unwrap();
    check_eviction_order(store.as_ref()).await;
    store.delete_oldest(usize::MAX).await.unwrap();
    check_delete_oldest(store.as_ref()).await;
    store.delete_oldest(usize::MAX).await.unwrap();
    check_search(store.as_ref()).await;
    store.delete_oldest(usize::MAX).await.unwrap();
    check_list_order(store.as_ref()).await;
    store.delete_oldest(usize::MAX).await.unwrap();
    check_delete_matching(store.as_ref()).await;
}

async fn check_bulk_insert_counts(store: &dyn ArticleStore) {
    let batch = vec![
        article("Rates rise", "The central bank raised rates.", date(2024, 1, 1)),
        article("Rates rise", "A different body under the same title.", date(2024, 1, 1)),
        article("Harvest report", "Wheat output is up.", None),
    ];
    let summary = store.bulk_insert(&batch).await.unwrap();
    assert_eq!(summary.added, 3);
    assert_eq!(summary.duplicates, 0);

    // Same (title, text) under a new link is still a duplicate.
    let mut relinked = batch[0].clone();
    relinked.link = "http://elsewhere.test/rates".to_string();
    let repeat = vec![
        relinked,
        batch[2].clone(),
        article("Fresh story", "Something new.", date(2024, 2, 2)),
        article("Fresh story", "Something new.", date(2024, 2, 2)),
    ];
    let summary = store.bulk_insert(&repeat).await.unwrap();
    assert_eq!(summary.added, 1);
    assert_eq!(summary.duplicates, 3);
    assert_eq!(store.count().await.unwrap(), 4);

    let summary = store.bulk_insert(&[]).await.unwrap();
    assert_eq!(summary.added + summary.duplicates, 0);
}

async fn check_eviction_order(store: &dyn ArticleStore) {
    let batch = vec![
        article("d2", "second day", date(2024, 5, 2)),
        article("undated", "no date given", None),
        article("d4", "fourth day", date(2024, 5, 4)),
        article("d1", "first day", date(2024, 5, 1)),
        article("d3", "third day", date(2024, 5, 3)),
    ];
    store.bulk_insert(&batch).await.unwrap();

    assert_eq!(store.evict_to_capacity(10).await.unwrap(), 0);
    assert_eq!(store.evict_to_capacity(5).await.unwrap(), 0);
    assert_eq!(store.evict_to_capacity(3).await.unwrap(), 2);
    assert_eq!(store.count().await.unwrap(), 3);

    let titles: Vec<String> = store.list_all().await.unwrap().into_iter().map(|a| a.title).collect();
    assert_eq!(titles, vec!["d4", "d3", "d2"]);

    assert_eq!(store.evict_to_capacity(0).await.unwrap(), 3);
    assert_eq!(store.count().await.unwrap(), 0);
}

async fn check_delete_oldest(store: &dyn ArticleStore) {
    let batch = vec![
        article("b", "same day, inserted first", date(2023, 7, 1)),
        article("c", "same day, inserted second", date(2023, 7, 1)),
        article("a", "later", date(2023, 8, 1)),
    ];
    store.bulk_insert(&batch).await.unwrap();

    assert_eq!(store.delete_oldest(0).await.unwrap(), 0);
    assert_eq!(store.delete_oldest(1).await.unwrap(), 1);
    let titles: Vec<String> = store.list_all().await.unwrap().into_iter().map(|a| a.title).collect();
    assert_eq!(titles, vec!["a", "c"]);

    assert_eq!(store.delete_oldest(10).await.unwrap(), 2);
    assert_eq!(store.count().await.unwrap(), 0);
}

async fn check_search(store: &dyn ArticleStore) {
    let batch = vec![
        article("Senate passes climate bill", "Lawmakers voted late on Tuesday.", date(2024, 3, 1)),
        article("Markets rally", "Stocks climbed. Climate funds climbed. Climate stocks too.", date(2024, 3, 2)),
        article("Local football", "The home team won again.", date(2024, 3, 3)),
    ];
    store.bulk_insert(&batch).await.unwrap();

    let hits = store.search("senate").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0], batch[0]);

    let hits = store.search("Climate").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Markets rally");

    let hits = store.search("football senate").await.unwrap();
    assert_eq!(hits.len(), 2);

    assert!(store.search("volcano").await.unwrap().is_empty());
    assert!(matches!(store.search("").await, Err(Error::InvalidQuery(_))));
    assert!(matches!(store.search("   ").await, Err(Error::InvalidQuery(_))));
}

async fn check_list_order(store: &dyn ArticleStore) {
    let mut full = article("full", "all metadata", date(2022, 1, 1));
    full.author = vec!["Jane Roe".to_string(), "John Doe".to_string()];
    full.keywords = ["economy", "tax"].into_iter().map(String::from).collect();
    full.tags = ["budget"].into_iter().map(String::from).collect();
    full.thumbnail = Some("http://news.test/img.png".to_string());
    let batch = vec![
        article("undated", "no date", None),
        full.clone(),
        article("newest", "recent", date(2024, 1, 1)),
    ];
    store.bulk_insert(&batch).await.unwrap();

    let listed = store.list_all().await.unwrap();
    let titles: Vec<&str> = listed.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["newest", "full", "undated"]);
    assert_eq!(listed[1], full);
}

async fn check_delete_matching(store: &dyn ArticleStore) {
    let batch = vec![
        article("keep", "useful", None),
        article("drop one", "No description available.", None),
        article("drop two", "No description available.", None),
    ];
    store.bulk_insert(&batch).await.unwrap();

    let is_junk = |a: &Article| a.text == "No description available.";
    assert_eq!(store.delete_matching(&is_junk).await.unwrap(), 2);
    assert_eq!(store.delete_matching(&is_junk).await.unwrap(), 0);
    assert_eq!(store.count().await.unwrap(), 1);

    // Deleted keys are free again.
    let summary = store.bulk_insert(&batch[1..2]).await.unwrap();
    assert_eq!(summary.added, 1);
}

pub async fn check_concurrent_inserts(store: Arc<dyn ArticleStore>) {
    let batch = vec![article("Race", "Two requests, one story.", date(2024, 4, 4))];
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let batch = batch.clone();
            tokio::spawn(async move { store.bulk_insert(&batch).await.unwrap() })
        })
        .collect();

    let mut added = 0;
    let mut duplicates = 0;
    for handle in handles {
        let summary = handle.await.unwrap();
        added += summary.added;
        duplicates += summary.duplicates;
    }
    assert_eq!(added, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(store.count().await.unwrap(), 1);
}

/// Tasks that each insert a batch and then trim the store race on the same
/// write lock; none of them may fail and the last trim wins.
pub async fn check_concurrent_ingest_and_evict(store: Arc<dyn ArticleStore>) {
    let handles: Vec<_> = (0..8u32)
        .map(|task| {
            let store = store.clone();
            tokio::spawn(async move {
                let batch: Vec<Article> = (0..5u32)
                    .map(|i| {
                        article(
                            &format!("Story {} {}", task, i),
                            &format!("Body of story {} from task {}.", i, task),
                            date(2024, 1 + task, 1 + i),
                        )
                    })
                    .collect();
                let summary = store.bulk_insert(&batch).await?;
                store.evict_to_capacity(10).await?;
                Ok::<_, Error>(summary.added)
            })
        })
        .collect();

    let mut added = 0;
    for handle in handles {
        added += handle.await.unwrap().unwrap();
    }
    assert_eq!(added, 40);
    assert_eq!(store.count().await.unwrap(), 10);
}
