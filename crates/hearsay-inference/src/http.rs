//! HTTP client for the inference service.
//!
//! JSON over plain HTTP; the service lives next to the bot (default
//! `http://api:8111`). Retraining can take minutes, so the request timeout
//! is generous and configurable.

use crate::types::{
    AttributeRequest, Attribution, AuthorList, RetrainParams, RetrainReport, Score, SelfReport,
    Sentiment, SentimentRequest,
};
use crate::InferenceService;
use async_trait::async_trait;
use hearsay_core::{config::InferenceConfig, error::HearsayError};
use reqwest::{Request, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Inference service reached over HTTP.
pub struct HttpInference {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInference {
    /// Create from config values.
    pub fn from_config(config: &InferenceConfig) -> Result<Self, HearsayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HearsayError::Inference(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn retrain_request(&self, params: &RetrainParams) -> Result<Request, HearsayError> {
        self.client
            .get(self.url("retrain"))
            .query(&[
                ("min_messages", params.min_messages.to_string()),
                ("cm", flag(params.confusion_matrix).to_string()),
                ("cf", params.cutoff_days.to_string()),
                ("bert", flag(params.bert).to_string()),
                ("gpu", flag(params.gpu).to_string()),
            ])
            .build()
            .map_err(|e| HearsayError::Inference(format!("invalid retrain request: {e}")))
    }

    fn readability_request(&self, nick: &str) -> Result<Request, HearsayError> {
        self.client
            .get(self.url("readability"))
            .query(&[("nick", nick)])
            .build()
            .map_err(|e| HearsayError::Inference(format!("invalid readability request: {e}")))
    }

    fn me_request(&self, nick: &str) -> Result<Request, HearsayError> {
        self.client
            .get(self.url("me"))
            .query(&[("author", nick)])
            .build()
            .map_err(|e| HearsayError::Inference(format!("invalid me request: {e}")))
    }

    fn post_request<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<Request, HearsayError> {
        self.client
            .post(self.url(path))
            .json(body)
            .build()
            .map_err(|e| HearsayError::Inference(format!("invalid {path} request: {e}")))
    }

    async fn call<T: DeserializeOwned>(&self, request: Request) -> Result<T, HearsayError> {
        let endpoint = request.url().path().to_string();
        debug!("inference request: {} {endpoint}", request.method());

        let resp = self
            .client
            .execute(request)
            .await
            .map_err(|e| HearsayError::Inference(format!("{endpoint} request failed: {e}")))?;
        decode(resp, &endpoint).await
    }
}

/// Map a response to its JSON body, treating non-2xx statuses as errors.
async fn decode<T: DeserializeOwned>(resp: Response, endpoint: &str) -> Result<T, HearsayError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(HearsayError::Inference(format!(
            "{endpoint} returned {status}: {body}"
        )));
    }
    resp.json::<T>()
        .await
        .map_err(|e| HearsayError::Inference(format!("{endpoint} response decode failed: {e}")))
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

#[async_trait]
impl InferenceService for HttpInference {
    async fn ping(&self) -> Result<(), HearsayError> {
        let request = self
            .client
            .get(self.url("ping"))
            .build()
            .map_err(|e| HearsayError::Inference(format!("invalid ping request: {e}")))?;
        let _: serde_json::Value = self.call(request).await?;
        Ok(())
    }

    async fn attribute(&self, msg: &str, min_messages: i64) -> Result<Attribution, HearsayError> {
        let body = AttributeRequest {
            msg,
            min_messages,
            confidence: true,
        };
        self.call(self.post_request("attribute", &body)?).await
    }

    async fn profile_attribute(
        &self,
        excerpts: &str,
        min_messages: i64,
    ) -> Result<Attribution, HearsayError> {
        let body = AttributeRequest {
            msg: excerpts,
            min_messages,
            confidence: true,
        };
        self.call(self.post_request("profile_attribute", &body)?)
            .await
    }

    async fn attribute_list(&self) -> Result<String, HearsayError> {
        let request = self
            .client
            .get(self.url("attribute_list"))
            .build()
            .map_err(|e| HearsayError::Inference(format!("invalid attribute_list request: {e}")))?;
        let list: AuthorList = self.call(request).await?;
        Ok(list.authors)
    }

    async fn sentiment(&self, msg: &str) -> Result<Sentiment, HearsayError> {
        self.call(self.post_request("sentiment", &SentimentRequest { msg })?)
            .await
    }

    async fn readability(&self, nick: &str) -> Result<f64, HearsayError> {
        let score: Score = self.call(self.readability_request(nick)?).await?;
        Ok(score.score)
    }

    async fn me(&self, nick: &str) -> Result<SelfReport, HearsayError> {
        self.call(self.me_request(nick)?).await
    }

    async fn retrain(&self, params: &RetrainParams) -> Result<RetrainReport, HearsayError> {
        self.call(self.retrain_request(params)?).await
    }
}
