use std::collections::HashSet;

use nb_core::config::JunkFilterConfig;
use nb_core::{Article, ArticleStore, Error, Result};
use regex::{Regex, RegexBuilder};
use tracing::info;

/// Recognises boilerplate articles: denylisted body texts and titles of
/// excluded publishers.
#[derive(Debug, Clone)]
pub struct JunkFilter {
    junk_text_values: HashSet<String>,
    junk_title_pattern: Option<Regex>,
}

impl JunkFilter {
    pub fn new(config: &JunkFilterConfig) -> Result<Self> {
        let junk_title_pattern = config
            .junk_title_pattern
            .as_deref()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::Config(format!("Invalid junk title pattern: {}", e)))
            })
            .transpose()?;

        Ok(Self {
            junk_text_values: config.junk_text_values.iter().cloned().collect(),
            junk_title_pattern,
        })
    }

    pub fn is_junk(&self, article: &Article) -> bool {
        self.junk_text_values.contains(&article.text)
            || self
                .junk_title_pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(&article.title))
    }

    /// Deletes every stored junk article. Running it again deletes nothing.
    pub async fn purge(&self, store: &dyn ArticleStore) -> Result<usize> {
        let purged = store
            .delete_matching(&|article: &Article| self.is_junk(article))
            .await?;
        if purged > 0 {
            info!("🧹 Purged {} junk articles", purged);
        }
        Ok(purged)
    }
}
