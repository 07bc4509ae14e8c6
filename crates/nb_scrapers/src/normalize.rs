//! Shapes scraped records into [`Article`]s.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate};
use nb_core::{Article, Error, RawArticle, Result};

/// Validates a raw record and converts it into an [`Article`].
///
/// Fails with [`Error::InvalidArticle`] when the title or text is missing or blank.
/// Every other field is best effort: blanks are dropped and an unreadable publish
/// date becomes `None`.
pub fn normalize(raw: RawArticle) -> Result<Article> {
    let title = required(raw.title, "title")?;
    let text = required(raw.text, "text")?;

    Ok(Article {
        link: optional(raw.link).unwrap_or_default(),
        title,
        text,
        author: unique_in_order(raw.author),
        publish_date: raw.publish_date.as_deref().and_then(parse_publish_date),
        keywords: clean_set(raw.keywords),
        tags: clean_set(raw.tags),
        thumbnail: optional(raw.thumbnail),
    })
}

/// Reads the calendar date out of the formats news sites commonly publish.
pub fn parse_publish_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    // Covers plain dates and naive timestamps such as "2024-05-01 10:00:00".
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    optional(value).ok_or_else(|| Error::InvalidArticle(format!("missing {}", field)))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn unique_in_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect()
}

fn clean_set(values: Vec<String>) -> BTreeSet<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: Option<&str>, text: Option<&str>) -> RawArticle {
        RawArticle {
            link: Some(" http://a/1 ".to_string()),
            title: title.map(String::from),
            text: text.map(String::from),
            ..RawArticle::default()
        }
    }

    #[test]
    fn test_rejects_missing_or_blank_fields() {
        assert!(matches!(normalize(raw(None, Some("body"))), Err(Error::InvalidArticle(_))));
        assert!(matches!(normalize(raw(Some("title"), None)), Err(Error::InvalidArticle(_))));
        assert!(matches!(normalize(raw(Some("   "), Some("body"))), Err(Error::InvalidArticle(_))));
        assert!(matches!(normalize(raw(Some("title"), Some("\n\t"))), Err(Error::InvalidArticle(_))));
    }

    #[test]
    fn test_shapes_fields() {
        let record = RawArticle {
            link: None,
            title: Some("  Budget passes  ".to_string()),
            text: Some("The budget passed.\n".to_string()),
            author: vec![" Ann ".to_string(), "".to_string(), "Ann".to_string(), "Bo".to_string()],
            publish_date: Some("2024-05-01T09:30:00+05:30".to_string()),
            keywords: vec!["tax".to_string(), " tax ".to_string(), " ".to_string()],
            tags: vec!["politics".to_string()],
            thumbnail: Some("  ".to_string()),
        };

        let article = normalize(record).unwrap();
        assert_eq!(article.link, "");
        assert_eq!(article.title, "Budget passes");
        assert_eq!(article.text, "The budget passed.");
        assert_eq!(article.author, vec!["Ann", "Bo"]);
        assert_eq!(article.publish_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(article.keywords.len(), 1);
        assert!(article.tags.contains("politics"));
        assert!(article.thumbnail.is_none());
    }

    #[test]
    fn test_parse_publish_date_formats() {
        let may_first = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert_eq!(parse_publish_date("2024-05-01"), may_first);
        assert_eq!(parse_publish_date("2024-05-01T23:10:00Z"), may_first);
        assert_eq!(parse_publish_date("Wed, 01 May 2024 08:00:00 +0000"), may_first);
        assert_eq!(parse_publish_date("2024-05-01 10:00:00"), may_first);
        assert_eq!(parse_publish_date(" 2024-05-01T10:00:00.123 "), may_first);
    }

    #[test]
    fn test_bad_dates_become_absent() {
        assert_eq!(parse_publish_date(""), None);
        assert_eq!(parse_publish_date("yesterday"), None);
        assert_eq!(parse_publish_date("2024-13-45"), None);
        assert_eq!(parse_publish_date("ñññññññññññ"), None);

        let mut record = raw(Some("t"), Some("b"));
        record.publish_date = Some("not a date".to_string());
        assert_eq!(normalize(record).unwrap().publish_date, None);
    }
}
