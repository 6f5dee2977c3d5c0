//! API client for the diamond pricing service

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// API client for the pricing service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Predict the price of one diamond
    pub async fn predict(
        &self,
        data: &Value,
        model_name: Option<&str>,
        model_version: Option<u32>,
    ) -> Result<f64> {
        let request = PredictRequest {
            data,
            model_name,
            model_version,
        };
        let response: PredictionResponse = self.post("/predict_price", &request).await?;

        response
            .result
            .first()
            .copied()
            .context("Server returned no prediction")
    }

    /// Fetch up to `count` dataset rows of the same grade, nearest carat first
    pub async fn similar(&self, data: &Value, count: usize) -> Result<Vec<Vec<Value>>> {
        let request = SimilarRequest {
            data,
            num_similar_diamonds: count,
        };
        let response: SimilarResponse = self.post("/similar_diamonds", &request).await?;
        Ok(response.result)
    }

    /// Make a POST request with JSON body
    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            anyhow::bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Failed to parse response")
    }
}

// API request and response types

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    data: &'a Value,
    model_name: Option<&'a str>,
    model_version: Option<u32>,
}

#[derive(Debug, Serialize)]
struct SimilarRequest<'a> {
    data: &'a Value,
    num_similar_diamonds: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResponse {
    pub result: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimilarResponse {
    pub result: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}
