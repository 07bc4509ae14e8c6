use std::collections::{BTreeMap, HashMap};
use std::fmt;

use async_trait::async_trait;
use nb_core::{Bias, BiasClassifier, Error, Result};

use crate::preprocess::preprocess_text;

/// Term weights used when the configuration supplies none.
/// Negative weights lean left, positive weights lean right.
const DEFAULT_LEXICON: &[(&str, f32)] = &[
    ("progressive", -1.0),
    ("inequality", -1.0),
    ("welfare", -0.8),
    ("secular", -0.8),
    ("minorities", -0.6),
    ("workers", -0.5),
    ("union", -0.5),
    ("climate", -0.5),
    ("activists", -0.4),
    ("protest", -0.4),
    ("conservative", 1.0),
    ("nationalist", 1.0),
    ("patriotic", 0.8),
    ("tradition", 0.8),
    ("infiltrators", 0.8),
    ("deregulation", 0.6),
    ("tax-cut", 0.6),
    ("border", 0.5),
    ("security", 0.4),
    ("heritage", 0.4),
];

/// Local classifier: sums lexicon weights over the preprocessed text.
pub struct LexiconModel {
    weights: HashMap<String, f32>,
}

impl fmt::Debug for LexiconModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LexiconModel")
            .field("terms", &self.weights.len())
            .finish()
    }
}

impl Default for LexiconModel {
    fn default() -> Self {
        Self {
            weights: DEFAULT_LEXICON
                .iter()
                .map(|(term, weight)| (term.to_string(), *weight))
                .collect(),
        }
    }
}

impl LexiconModel {
    /// Uses `lexicon` when non-empty, the built-in lexicon otherwise.
    pub fn new(lexicon: &BTreeMap<String, f32>) -> Self {
        if lexicon.is_empty() {
            return Self::default();
        }
        Self {
            weights: lexicon
                .iter()
                .map(|(term, weight)| (preprocess_text(term), *weight))
                .filter(|(term, _)| !term.is_empty())
                .collect(),
        }
    }

    pub fn score(&self, text: &str) -> Option<f32> {
        let processed = preprocess_text(text);
        if processed.is_empty() {
            return None;
        }
        Some(
            processed
                .split_whitespace()
                .filter_map(|word| self.weights.get(word))
                .sum(),
        )
    }
}

#[async_trait]
impl BiasClassifier for LexiconModel {
    fn name(&self) -> &str {
        "Lexicon"
    }

    async fn predict(&self, text: &str) -> Result<Bias> {
        let score = self
            .score(text)
            .ok_or_else(|| Error::Inference("Nothing to classify".to_string()))?;
        Ok(if score > 0.0 { Bias::Right } else { Bias::Left })
    }
}
