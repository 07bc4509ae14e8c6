use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use nb_core::{Bias, BiasClassifier, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct PredictRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BiasField {
    Batch(Vec<i64>),
    Single(i64),
}

#[derive(Deserialize)]
struct PredictResponse {
    bias: BiasField,
}

/// Classifier served by an external prediction service.
pub struct RemoteModel {
    client: Client,
    base_url: String,
}

impl RemoteModel {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl fmt::Debug for RemoteModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteModel")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Accepts both `{"bias": [1]}` and `{"bias": 1}`.
fn parse_response(body: &str) -> Result<Bias> {
    let response: PredictResponse = serde_json::from_str(body)?;
    let index = match response.bias {
        BiasField::Batch(values) => values
            .first()
            .copied()
            .ok_or_else(|| Error::Inference("Empty prediction".to_string()))?,
        BiasField::Single(value) => value,
    };
    Bias::from_index(index).ok_or_else(|| Error::Inference(format!("Unknown bias label: {}", index)))
}

#[async_trait]
impl BiasClassifier for RemoteModel {
    fn name(&self) -> &str {
        "Remote"
    }

    async fn predict(&self, text: &str) -> Result<Bias> {
        let body = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&PredictRequest { text })
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_response(&body)
    }
}
