use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use nb_core::config::StorageConfig;
use nb_core::storage::{search_terms, ArticlePredicate};
use nb_core::{Article, ArticleStore, Error, InsertSummary, Result};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::{Row, Sqlite};
use tracing::debug;

use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        link TEXT NOT NULL,
        title TEXT NOT NULL,
        text TEXT NOT NULL,
        author TEXT NOT NULL DEFAULT '[]',
        publish_date TEXT,
        keywords TEXT NOT NULL DEFAULT '[]',
        tags TEXT NOT NULL DEFAULT '[]',
        thumbnail TEXT,
        UNIQUE (title, text)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS articles_by_publish_date ON articles (publish_date, id)
    "#,
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS articles_fts
    USING fts5(title, text, content='articles', content_rowid='id')
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS articles_fts_insert AFTER INSERT ON articles BEGIN
        INSERT INTO articles_fts (rowid, title, text) VALUES (new.id, new.title, new.text);
    END
    "#,
    r#"
    CREATE TRIGGER IF NOT EXISTS articles_fts_delete AFTER DELETE ON articles BEGIN
        INSERT INTO articles_fts (articles_fts, rowid, title, text)
        VALUES ('delete', old.id, old.title, old.text);
    END
    "#,
    // Add future migrations here
];

const COLUMNS: &str = "id, link, title, text, author, publish_date, keywords, tags, thumbnail";

/// Undated first, then ascending date, then insertion order.
const OLDEST_FIRST: &str = "publish_date IS NOT NULL, publish_date ASC, id ASC";

const DATE_FORMAT: &str = "%Y-%m-%d";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| Error::Storage(format!("{}: {}", context, e))
}

/// Write transaction opened with `BEGIN IMMEDIATE`.
///
/// The write lock is taken before anything is read, so concurrent writers queue
/// on the busy timeout instead of failing when a deferred transaction tries to
/// upgrade its lock. Dropping it without `commit` rolls back.
struct WriteTransaction {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTransaction {
    async fn begin(pool: &SqlitePool) -> Result<Self> {
        let mut conn = pool.acquire().await.map_err(db_error("Failed to acquire connection"))?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(db_error("Failed to start transaction"))?;
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_deref_mut()
            .ok_or_else(|| Error::Storage("Transaction already finished".to_string()))
    }

    async fn commit(mut self, context: &'static str) -> Result<()> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };
        if let Err(e) = sqlx::query("COMMIT").execute(&mut *conn).await {
            let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
            return Err(db_error(context)(e));
        }
        Ok(())
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        // The connection must not go back to the pool with the transaction still open.
        if let Some(mut conn) = self.conn.take() {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                    });
                }
                // Closing the connection rolls back as well.
                Err(_) => drop(conn.detach()),
            }
        }
    }
}

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database path should be writable"
    }

    async fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::new_with_path(Path::new(&config.path)).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn fetch_articles(&self, sql: &str) -> Result<Vec<(i64, Article)>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to read articles"))?;
        rows.iter().map(row_to_article).collect()
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn row_to_article(row: &SqliteRow) -> Result<(i64, Article)> {
    let id: i64 = row.try_get("id").map_err(db_error("Failed to decode id"))?;
    let author: String = row.try_get("author").map_err(db_error("Failed to decode author"))?;
    let keywords: String = row.try_get("keywords").map_err(db_error("Failed to decode keywords"))?;
    let tags: String = row.try_get("tags").map_err(db_error("Failed to decode tags"))?;
    let publish_date = row
        .try_get::<Option<String>, _>("publish_date")
        .map_err(db_error("Failed to decode publish_date"))?
        .map(|d| NaiveDate::parse_from_str(&d, DATE_FORMAT))
        .transpose()
        .map_err(|e| Error::Storage(format!("Failed to parse date: {}", e)))?;

    let article = Article {
        link: row.try_get("link").map_err(db_error("Failed to decode link"))?,
        title: row.try_get("title").map_err(db_error("Failed to decode title"))?,
        text: row.try_get("text").map_err(db_error("Failed to decode text"))?,
        author: serde_json::from_str(&author)?,
        publish_date,
        keywords: serde_json::from_str(&keywords)?,
        tags: serde_json::from_str(&tags)?,
        thumbnail: row.try_get("thumbnail").map_err(db_error("Failed to decode thumbnail"))?,
    };
    Ok((id, article))
}

/// Quotes every term so user input cannot inject FTS5 query syntax.
fn match_expression(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[async_trait]
impl ArticleStore for SQLiteStorage {
    async fn bulk_insert(&self, articles: &[Article]) -> Result<InsertSummary> {
        let mut summary = InsertSummary::default();
        if articles.is_empty() {
            return Ok(summary);
        }

        let mut tx = WriteTransaction::begin(&self.pool).await?;
        for article in articles {
            // The UNIQUE (title, text) constraint decides; an ignored row is a duplicate.
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO articles
                (link, title, text, author, publish_date, keywords, tags, thumbnail)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&article.link)
            .bind(&article.title)
            .bind(&article.text)
            .bind(to_json(&article.author)?)
            .bind(article.publish_date.map(|d| d.format(DATE_FORMAT).to_string()))
            .bind(to_json(&article.keywords)?)
            .bind(to_json(&article.tags)?)
            .bind(article.thumbnail.as_deref())
            .execute(tx.conn()?)
            .await
            .map_err(db_error("Failed to store article"))?;

            if result.rows_affected() == 1 {
                summary.added += 1;
            } else {
                summary.duplicates += 1;
            }
        }
        tx.commit("Failed to commit articles").await?;

        debug!(added = summary.added, duplicates = summary.duplicates, "bulk insert");
        Ok(summary)
    }

    async fn evict_to_capacity(&self, max_count: usize) -> Result<usize> {
        let mut tx = WriteTransaction::begin(&self.pool).await?;
        let total: i64 = sqlx::query("SELECT COUNT(*) FROM articles")
            .fetch_one(tx.conn()?)
            .await
            .and_then(|row| row.try_get(0))
            .map_err(db_error("Failed to count articles"))?;

        let excess = (total as usize).saturating_sub(max_count);
        if excess == 0 {
            tx.commit("Failed to commit eviction").await?;
            return Ok(0);
        }

        let result = sqlx::query(&format!(
            "DELETE FROM articles WHERE id IN (SELECT id FROM articles ORDER BY {} LIMIT ?)",
            OLDEST_FIRST
        ))
        .bind(excess as i64)
        .execute(tx.conn()?)
        .await
        .map_err(db_error("Failed to evict articles"))?;
        tx.commit("Failed to commit eviction").await?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_oldest(&self, n: usize) -> Result<usize> {
        // A negative LIMIT means "no limit" to SQLite.
        if n == 0 {
            return Ok(0);
        }
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        let mut tx = WriteTransaction::begin(&self.pool).await?;
        let result = sqlx::query(&format!(
            "DELETE FROM articles WHERE id IN (SELECT id FROM articles ORDER BY {} LIMIT ?)",
            OLDEST_FIRST
        ))
        .bind(limit)
        .execute(tx.conn()?)
        .await
        .map_err(db_error("Failed to delete oldest articles"))?;
        tx.commit("Failed to commit deletions").await?;

        Ok(result.rows_affected() as usize)
    }

    async fn search(&self, keyword: &str) -> Result<Vec<Article>> {
        let terms = search_terms(keyword);
        if terms.is_empty() {
            return Err(Error::InvalidQuery("No keyword provided".to_string()));
        }

        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM articles
            JOIN (
                SELECT rowid, bm25(articles_fts) AS score
                FROM articles_fts WHERE articles_fts MATCH ?
            ) AS hits ON hits.rowid = articles.id
            ORDER BY hits.score ASC, articles.id ASC
            "#,
            COLUMNS
        ))
        .bind(match_expression(&terms))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to search articles"))?;

        rows.iter()
            .map(|row| row_to_article(row).map(|(_, article)| article))
            .collect()
    }

    async fn list_all(&self) -> Result<Vec<Article>> {
        let articles = self
            .fetch_articles(&format!(
                "SELECT {} FROM articles ORDER BY publish_date IS NULL, publish_date DESC, id DESC",
                COLUMNS
            ))
            .await?;
        Ok(articles.into_iter().map(|(_, article)| article).collect())
    }

    async fn delete_matching(&self, predicate: ArticlePredicate<'_>) -> Result<usize> {
        let mut tx = WriteTransaction::begin(&self.pool).await?;
        let rows = sqlx::query(&format!("SELECT {} FROM articles", COLUMNS))
            .fetch_all(tx.conn()?)
            .await
            .map_err(db_error("Failed to read articles"))?;

        let mut doomed = Vec::new();
        for row in &rows {
            let (id, article) = row_to_article(row)?;
            if predicate(&article) {
                doomed.push(id);
            }
        }

        let mut deleted = 0;
        for id in doomed {
            let result = sqlx::query("DELETE FROM articles WHERE id = ?")
                .bind(id)
                .execute(tx.conn()?)
                .await
                .map_err(db_error("Failed to delete article"))?;
            deleted += result.rows_affected() as usize;
        }
        tx.commit("Failed to commit deletions").await?;

        Ok(deleted)
    }

    async fn count(&self) -> Result<usize> {
        let total: i64 = sqlx::query("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get(0))
            .map_err(db_error("Failed to count articles"))?;
        Ok(total as usize)
    }
}
