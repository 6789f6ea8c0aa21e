//! # hearsay-inference
//!
//! Client for the remote attribution and text-analysis service.

pub mod http;
pub mod types;

pub use http::HttpInference;
pub use types::{Attribution, RetrainParams, RetrainReport, SelfReport, Sentiment};

use async_trait::async_trait;
use hearsay_core::error::HearsayError;

/// Request/response operations offered by the inference service.
///
/// Every transport or decode failure is a [`HearsayError::Inference`].
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Liveness check.
    async fn ping(&self) -> Result<(), HearsayError>;

    /// Predict the author of a message among handles with at least `min_messages` messages.
    async fn attribute(&self, msg: &str, min_messages: i64) -> Result<Attribution, HearsayError>;

    /// Predict the author of a profile's concatenated excerpts.
    async fn profile_attribute(
        &self,
        excerpts: &str,
        min_messages: i64,
    ) -> Result<Attribution, HearsayError>;

    /// Handles the current model can predict, as a display string.
    async fn attribute_list(&self) -> Result<String, HearsayError>;

    async fn sentiment(&self, msg: &str) -> Result<Sentiment, HearsayError>;

    /// Flesch-Kincaid reading ease over a handle's stored messages.
    async fn readability(&self, nick: &str) -> Result<f64, HearsayError>;

    /// Readability, sentiment and nearest neighbour of a handle.
    async fn me(&self, nick: &str) -> Result<SelfReport, HearsayError>;

    /// Refit the attribution model.
    async fn retrain(&self, params: &RetrainParams) -> Result<RetrainReport, HearsayError>;
}
