pub mod junk;
pub mod logging;
pub mod manager;
pub mod normalize;
pub mod scrapers;

pub use junk::JunkFilter;
pub use manager::{IngestOutcome, IngestReport, IngestRequest, IngestionManager};
pub use normalize::normalize;
pub use scrapers::WebsiteScraper;

pub mod prelude {
    pub use super::manager::{IngestOutcome, IngestRequest, IngestionManager};
    pub use nb_core::{Article, Error, RawArticle, Result, SiteScraper};
}
