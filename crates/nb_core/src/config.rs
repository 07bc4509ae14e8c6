//! Application configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration. The CLI overrides individual values with its flags.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_MAX_ARTICLES: usize = 1500;
pub const DEFAULT_ARTICLE_COUNT: usize = 50;
pub const DEFAULT_DELETE_COUNT: usize = 1000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
    pub junk: JunkFilterConfig,
    pub classifier: ClassifierConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `memory` or `sqlite`
    pub backend: String,
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            path: "articles.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Upper bound on stored articles, enforced after every ingestion.
    pub max_articles: usize,
    /// Articles requested per website when the caller gives no count.
    pub default_count: usize,
    pub max_concurrent_sites: usize,
    pub site_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl IngestConfig {
    pub fn site_timeout(&self) -> Duration {
        Duration::from_secs(self.site_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_articles: DEFAULT_MAX_ARTICLES,
            default_count: DEFAULT_ARTICLE_COUNT,
            max_concurrent_sites: 4,
            site_timeout_secs: 120,
            request_timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JunkFilterConfig {
    /// Body texts that mark an article as boilerplate.
    pub junk_text_values: BTreeSet<String>,
    /// Case-insensitive pattern for titles of excluded publishers.
    pub junk_title_pattern: Option<String>,
}

impl Default for JunkFilterConfig {
    fn default() -> Self {
        let junk_text_values = [
            "",
            "Get App for Better Experience",
            "Log onto movie.ndtv.com for more celebrity pictures",
            "No description available.",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            junk_text_values,
            junk_title_pattern: Some("^(dell|hp|acer|lenovo)".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// `lexicon` or `remote`
    pub model: String,
    /// Base URL of the prediction service used by the remote model.
    pub url: Option<String>,
    /// Term weights for the lexicon model; negative leans left, positive right.
    /// Empty means the built-in lexicon.
    pub lexicon: BTreeMap<String, f32>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "lexicon".to_string(),
            url: None,
            lexicon: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_string(),
        }
    }
}
