use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A normalized news article as it is stored and served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub link: String,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub author: Vec<String>,
    #[serde(default)]
    pub publish_date: Option<NaiveDate>,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl Article {
    /// Creates an article with only the required fields set.
    pub fn new(link: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            text: text.into(),
            author: Vec::new(),
            publish_date: None,
            keywords: BTreeSet::new(),
            tags: BTreeSet::new(),
            thumbnail: None,
        }
    }

    pub fn with_publish_date(mut self, date: Option<NaiveDate>) -> Self {
        self.publish_date = date;
        self
    }

    /// The (title, text) pair that identifies an article in the store.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.title, &self.text)
    }
}

/// An article record as a site scraper produced it, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub author: Vec<String>,
    #[serde(default)]
    pub publish_date: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Counts reported by a bulk insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertSummary {
    pub added: usize,
    pub duplicates: usize,
}

/// Political leaning predicted for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Left,
    Right,
}

impl Bias {
    pub fn label(&self) -> &'static str {
        match self {
            Bias::Left => "left",
            Bias::Right => "right",
        }
    }

    pub fn as_index(&self) -> u8 {
        match self {
            Bias::Left => 0,
            Bias::Right => 1,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Bias::Left),
            1 => Some(Bias::Right),
            _ => None,
        }
    }
}
