use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZakladkaError};
use crate::types::{Highlight, HighlightKind};

/// Environment variable holding the annotation API base URL.
pub const API_URL_ENV: &str = "ZAKLADKA_API_URL";

/// Request timeout for annotation API calls. Keeps a stalled server
/// from blocking a session that can already render from the cache.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Annotation payload returned by the remote store. The transcript is
/// included so a session opened without one can adopt the stored copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedAnnotations {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub transcript_highlights: Vec<Highlight>,
    #[serde(default)]
    pub outline_highlights: Vec<Highlight>,
}

/// Body of an annotation PUT: one kind's full highlight set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    pub acting_user_id: String,
    pub kind: HighlightKind,
    pub highlights: Vec<Highlight>,
}

/// The remote durable tier, behind a trait so the store can be
/// exercised against an in-memory fake.
#[async_trait]
pub trait RemoteAnnotations: Send + Sync {
    /// Fetch stored annotations for a resource. `Ok(None)` means the
    /// resource has none.
    async fn fetch(&self, resource_id: &str) -> Result<Option<FetchedAnnotations>>;

    /// Persist one kind's highlight set. Best-effort: callers log
    /// failures and move on.
    async fn push(&self, resource_id: &str, request: &PushRequest) -> Result<()>;
}

/// HTTP client for the annotation API.
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Build a client from the `ZAKLADKA_API_URL` environment variable.
    pub fn from_env() -> Result<Option<Self>> {
        std::env::var(API_URL_ENV).ok().map(Self::new).transpose()
    }

    fn annotations_url(&self, resource_id: &str) -> String {
        format!(
            "{}/annotations/{}",
            self.base_url.trim_end_matches('/'),
            resource_id
        )
    }
}

#[async_trait]
impl RemoteAnnotations for HttpRemote {
    async fn fetch(&self, resource_id: &str) -> Result<Option<FetchedAnnotations>> {
        let response = self
            .client
            .get(self.annotations_url(resource_id))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ZakladkaError::FetchFailed {
                resource_id: resource_id.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        Ok(Some(response.json::<FetchedAnnotations>().await?))
    }

    async fn push(&self, resource_id: &str, request: &PushRequest) -> Result<()> {
        let response = self
            .client
            .put(self.annotations_url(resource_id))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ZakladkaError::PushFailed {
                resource_id: resource_id.to_string(),
                reason: format!("status {}", response.status()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetched_annotations_deserialize_from_wire_shape() {
        let raw = r#"{
            "transcript": "full text",
            "transcriptHighlights": [{"id": "a", "start": 0, "end": 5}],
            "outlineHighlights": []
        }"#;
        let fetched: FetchedAnnotations = serde_json::from_str(raw).unwrap();
        assert_eq!(fetched.transcript.as_deref(), Some("full text"));
        assert_eq!(fetched.transcript_highlights.len(), 1);
        assert!(fetched.outline_highlights.is_empty());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let fetched: FetchedAnnotations = serde_json::from_str("{}").unwrap();
        assert!(fetched.transcript.is_none());
        assert!(fetched.transcript_highlights.is_empty());
    }

    #[test]
    fn push_request_serializes_with_camel_case_keys() {
        let request = PushRequest {
            acting_user_id: "user-7".into(),
            kind: HighlightKind::Outline,
            highlights: vec![Highlight {
                id: "h".into(),
                start: 1,
                end: 2,
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["actingUserId"], "user-7");
        assert_eq!(json["kind"], "outline");
        assert_eq!(json["highlights"][0]["start"], 1);
    }

    #[test]
    fn annotation_urls_tolerate_trailing_slash() {
        let remote = HttpRemote::new("http://localhost:3001/api/").unwrap();
        assert_eq!(
            remote.annotations_url("42"),
            "http://localhost:3001/api/annotations/42"
        );
    }
}
