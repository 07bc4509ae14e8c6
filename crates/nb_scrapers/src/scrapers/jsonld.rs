use scraper::{Html, Selector};
use serde_json::Value;

/// All JSON-LD objects in the document, with top-level arrays and `@graph`
/// containers flattened.
pub fn objects(document: &Html) -> Vec<Value> {
    let mut objects = Vec::new();

    if let Ok(script_selector) = Selector::parse("script[type='application/ld+json']") {
        for script in document.select(&script_selector) {
            let raw = script.text().collect::<String>();
            if let Ok(json) = serde_json::from_str::<Value>(raw.trim()) {
                flatten(json, &mut objects);
            }
        }
    }

    objects
}

fn flatten(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| flatten(item, out)),
        Value::Object(mut obj) => {
            if let Some(graph) = obj.remove("@graph") {
                flatten(graph, out);
            }
            if !obj.is_empty() {
                out.push(Value::Object(obj));
            }
        }
        _ => {}
    }
}

/// Extracts authors from JSON-LD metadata in the HTML document.
/// Returns a vector of author names.
pub fn extract_authors(document: &Html) -> Vec<String> {
    let mut authors = Vec::new();

    for json in objects(document) {
        match json.get("author") {
            Some(Value::Array(arr)) => {
                for author in arr {
                    match author {
                        Value::String(s) => authors.push(s.trim().to_string()),
                        other => {
                            if let Some(name) = other.get("name").and_then(|n| n.as_str()) {
                                authors.push(name.trim().to_string());
                            }
                        }
                    }
                }
            }
            Some(Value::Object(obj)) => {
                if let Some(name) = obj.get("name").and_then(|n| n.as_str()) {
                    authors.push(name.trim().to_string());
                }
            }
            Some(Value::String(s)) => authors.push(s.trim().to_string()),
            _ => {}
        }
    }

    authors
}

pub fn extract_date_published(document: &Html) -> Option<String> {
    objects(document)
        .iter()
        .find_map(|json| json.get("datePublished").and_then(|d| d.as_str()))
        .map(|d| d.trim().to_string())
}

/// `keywords` may be a comma separated string or an array of strings.
pub fn extract_keywords(document: &Html) -> Vec<String> {
    let mut keywords = Vec::new();

    for json in objects(document) {
        match json.get("keywords") {
            Some(Value::String(s)) => keywords.extend(s.split(',').map(|k| k.trim().to_string())),
            Some(Value::Array(arr)) => keywords.extend(
                arr.iter()
                    .filter_map(|k| k.as_str())
                    .map(|k| k.trim().to_string()),
            ),
            _ => {}
        }
    }

    keywords
}
