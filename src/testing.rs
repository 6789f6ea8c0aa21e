//! Fakes shared by the gateway and command tests.

use async_trait::async_trait;
use hearsay_core::{error::HearsayError, traits::ChatSession};
use hearsay_inference::{
    Attribution, InferenceService, RetrainParams, RetrainReport, SelfReport, Sentiment,
};
use hearsay_storage::Store;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Fresh in-memory store per call; nothing touches the filesystem.
pub(crate) async fn test_store() -> Store {
    Store::in_memory().await.unwrap()
}

/// Records every outgoing operation as a protocol-like line.
#[derive(Default)]
pub(crate) struct RecordingSession {
    pub(crate) sent: Mutex<Vec<String>>,
    /// Never return from `leave`, like a server that ignores QUIT.
    pub(crate) hang_on_leave: bool,
}

impl RecordingSession {
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, line: String) {
        self.sent.lock().unwrap().push(line);
    }
}

#[async_trait]
impl ChatSession for RecordingSession {
    async fn join(&self, channel: &str) -> Result<(), HearsayError> {
        self.record(format!("JOIN {channel}"));
        Ok(())
    }

    async fn send_private(&self, target: &str, text: &str) -> Result<(), HearsayError> {
        self.record(format!("PRIVMSG {target} {text}"));
        Ok(())
    }

    async fn set_mode(&self, target: &str, mode: &str) -> Result<(), HearsayError> {
        self.record(format!("MODE {target} {mode}"));
        Ok(())
    }

    async fn announce_away(&self, text: &str) -> Result<(), HearsayError> {
        self.record(format!("AWAY {text}"));
        Ok(())
    }

    async fn leave(&self, reason: &str) -> Result<(), HearsayError> {
        self.record(format!("QUIT {reason}"));
        if self.hang_on_leave {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

/// Canned inference answers; `failing` turns every call into an error.
#[derive(Default)]
pub(crate) struct FakeInference {
    pub(crate) failing: bool,
    pub(crate) retrains: AtomicUsize,
    pub(crate) last_msg: Mutex<Option<String>>,
}

impl FakeInference {
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), HearsayError> {
        if self.failing {
            Err(HearsayError::Inference("service unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl InferenceService for FakeInference {
    async fn ping(&self) -> Result<(), HearsayError> {
        self.check()
    }

    async fn attribute(&self, msg: &str, _min_messages: i64) -> Result<Attribution, HearsayError> {
        self.check()?;
        *self.last_msg.lock().unwrap() = Some(msg.to_string());
        Ok(Attribution {
            author: "katt".into(),
            confidence: "katt_: 1.20".into(),
        })
    }

    async fn profile_attribute(
        &self,
        excerpts: &str,
        min_messages: i64,
    ) -> Result<Attribution, HearsayError> {
        self.attribute(excerpts, min_messages).await
    }

    async fn attribute_list(&self) -> Result<String, HearsayError> {
        self.check()?;
        Ok("alice_, katt_".into())
    }

    async fn sentiment(&self, _msg: &str) -> Result<Sentiment, HearsayError> {
        self.check()?;
        Ok(Sentiment {
            pos: 0.5,
            neu: 0.4,
            neg: 0.1,
            label: "positive".into(),
            compound: 0.62,
        })
    }

    async fn readability(&self, _nick: &str) -> Result<f64, HearsayError> {
        self.check()?;
        Ok(72.5)
    }

    async fn me(&self, _nick: &str) -> Result<SelfReport, HearsayError> {
        self.check()?;
        Ok(SelfReport {
            readability: 72.5,
            sentiment: 0.1,
            sentiment_label: "neutral".into(),
            neighbour: "bob".into(),
        })
    }

    async fn retrain(&self, _params: &RetrainParams) -> Result<RetrainReport, HearsayError> {
        self.check()?;
        self.retrains.fetch_add(1, Ordering::Relaxed);
        Ok(RetrainReport {
            fit_secs: 3.25,
            url: String::new(),
            accuracy: 0.0,
            f1: 0.0,
        })
    }
}
