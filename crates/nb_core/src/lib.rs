pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::{classifier_input, BiasClassifier, SiteScraper};
pub use storage::ArticleStore;
pub use types::{Article, Bias, InsertSummary, RawArticle};
