//! Session phases and the observable session snapshot

use crate::{ContentId, ProfileId, Quality, SessionId};
use serde::{Deserialize, Serialize};
use url::Url;

/// Playback session phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    /// No session, or waiting for content and profile
    #[default]
    Idle,
    /// Waiting for the playback token
    AcquiringToken,
    /// Waiting for the stream descriptor
    ResolvingManifest,
    /// Stream resolved, playback may render
    Ready,
    /// Fatal failure; terminal for the session
    Error,
}

impl SessionPhase {
    /// Check if transition to target phase is valid
    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, target),
            (Idle, AcquiringToken)
                | (AcquiringToken, ResolvingManifest)
                | (AcquiringToken, Error)
                | (ResolvingManifest, Ready)
                | (ResolvingManifest, Error)
        )
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::AcquiringToken => write!(f, "acquiring-token"),
            SessionPhase::ResolvingManifest => write!(f, "resolving-manifest"),
            SessionPhase::Ready => write!(f, "ready"),
            SessionPhase::Error => write!(f, "error"),
        }
    }
}

/// Read-only view of the session handed to the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Option<SessionId>,
    pub content_id: Option<ContentId>,
    pub profile_id: Option<ProfileId>,
    pub phase: SessionPhase,
    pub title: Option<String>,
    /// Source for the player; follows the selected quality when a variant matches
    pub stream_url: Option<Url>,
    pub duration: Option<f64>,
    /// Offset the player starts from
    pub resume_position: f64,
    /// True once `resume_position` is final: the manifest carried one or the
    /// resume store lookup has finished, successfully or not
    pub resume_settled: bool,
    pub qualities: Vec<Quality>,
    /// False until the catalog loads, and for good if it fails
    pub quality_switch_enabled: bool,
    pub current_quality: Option<String>,
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    pub fn is_error(&self) -> bool {
        self.phase == SessionPhase::Error
    }
}
