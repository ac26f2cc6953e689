//! Core types for Reel playback

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Unique identifier for one watch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a content item in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the viewer profile watching
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl ProfileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short-lived authorization for one profile to stream one content item
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl PlaybackToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Returns true once `now` has reached the expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// Keep the credential out of logs
impl std::fmt::Debug for PlaybackToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// One renditioned stream source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamVariant {
    /// Quality label, e.g. "1080p"
    pub quality: String,
    /// Resolution as reported by the API, e.g. "1920x1080"
    #[serde(default)]
    pub resolution: Option<String>,
    /// Playable URL (HLS/DASH manifest)
    pub url: Url,
}

/// Playable stream descriptor returned by the manifest call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamManifest {
    pub content_id: ContentId,
    #[serde(default)]
    pub title: String,
    /// Ordered variants; the first one is the default source
    pub variants: Vec<StreamVariant>,
    /// Resume offset in seconds, absent when nothing was recorded
    #[serde(default)]
    pub resume_position: Option<f64>,
    /// Total duration in seconds
    pub duration: f64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl StreamManifest {
    /// Token as re-issued with the manifest
    pub fn playback_token(&self) -> PlaybackToken {
        PlaybackToken::new(self.token.clone(), self.expires_at)
    }
}

/// Variant for a quality label, falling back to the default (first) source
pub fn select_variant<'a>(
    variants: &'a [StreamVariant],
    quality: Option<&str>,
) -> Option<&'a StreamVariant> {
    quality
        .and_then(|label| variants.iter().find(|v| v.quality == label))
        .or_else(|| variants.first())
}

/// Rendition entry of the quality catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quality {
    pub quality: String,
    #[serde(default)]
    pub resolution: Option<String>,
    /// Human-readable approximate size, e.g. "1.2 GB"
    #[serde(default)]
    pub file_size: Option<String>,
}

/// Payload of a progress report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    /// Playback offset in seconds
    pub position: f64,
    /// Total duration in seconds
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl ProgressReport {
    /// Report marking the content as fully watched
    pub fn completed(duration: f64, quality: Option<String>) -> Self {
        Self {
            position: duration,
            duration,
            quality,
        }
    }
}
