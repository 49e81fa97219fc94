use async_trait::async_trait;
use pitchroom_config::StoreConfig;
use pitchroom_core::{CallId, Speaker};
use serde::{Deserialize, Serialize};

/// A persisted utterance segment, as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub speaker: Speaker,
    pub text: String,
    pub start_offset: f64,
    pub duration: f64,
}

/// A recorded practice call as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: CallId,
    #[serde(default)]
    pub title: Option<String>,
    /// Raw transcript text, used to derive segments when no precomputed
    /// list exists.
    #[serde(default)]
    pub transcript: Option<String>,
    /// Precomputed replay segments, if the backend has them.
    #[serde(default)]
    pub segments: Option<Vec<SegmentRecord>>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("call {0} not found")]
    NotFound(CallId),
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned malformed data: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read access to persisted call records.
///
/// Persistence itself is an external collaborator; this is the seam the
/// replay session fetches through. One attempt per load, no retries:
/// a failed fetch is a terminal initialization error for the session.
#[async_trait]
pub trait ReplayStore: Send + Sync + 'static {
    async fn fetch_call(&self, id: CallId) -> Result<CallRecord, StoreError>;
}

/// HTTP-backed store client.
pub struct HttpReplayStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReplayStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReplayStore for HttpReplayStore {
    async fn fetch_call(&self, id: CallId) -> Result<CallRecord, StoreError> {
        let url = format!("{}/api/calls/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id));
        }

        let record = response.error_for_status()?.json::<CallRecord>().await?;
        Ok(record)
    }
}
