//! Wire types of the inference service.

use serde::{Deserialize, Serialize};

/// Predicted author of a text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Attribution {
    pub author: String,
    /// Per-author decision scores, pre-formatted by the service.
    #[serde(default)]
    pub confidence: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sentiment {
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
    /// Human-readable label ("positive", "neutral", "negative").
    #[serde(rename = "hr")]
    pub label: String,
    pub compound: f64,
}

/// Statistics about a single handle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelfReport {
    pub readability: f64,
    pub sentiment: f64,
    #[serde(rename = "sentiment_hr")]
    pub sentiment_label: String,
    pub neighbour: String,
}

/// Options of a retrain request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrainParams {
    /// Compute a confusion matrix and cross-validation scores.
    pub confusion_matrix: bool,
    /// Ignore handles inactive for more than this many days (0 = keep all).
    pub cutoff_days: u32,
    pub bert: bool,
    pub gpu: bool,
    pub min_messages: i64,
}

/// Result of a retrain.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RetrainReport {
    /// Seconds spent fitting.
    #[serde(rename = "time")]
    pub fit_secs: f64,
    /// Confusion-matrix link; empty unless requested.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub f1: f64,
}

#[derive(Serialize)]
pub(crate) struct AttributeRequest<'a> {
    pub msg: &'a str,
    pub min_messages: i64,
    pub confidence: bool,
}

#[derive(Serialize)]
pub(crate) struct SentimentRequest<'a> {
    pub msg: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct AuthorList {
    pub authors: String,
}

#[derive(Deserialize)]
pub(crate) struct Score {
    pub score: f64,
}
