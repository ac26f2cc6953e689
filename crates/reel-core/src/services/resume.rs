//! Resume Position Store

use crate::{ContentId, PlaybackToken, ProfileId, ProgressReport, Result};
use async_trait::async_trait;

/// Last known playback offset per (content, profile)
#[async_trait]
pub trait ResumePositionStore: Send + Sync {
    /// GetResumePosition `{contentId, profileId}` -> position in seconds
    async fn get_position(&self, content_id: &ContentId, profile_id: &ProfileId) -> Result<f64>;

    /// PutProgress `{token, position, duration, quality?}`
    async fn put_progress(&self, token: &PlaybackToken, report: &ProgressReport) -> Result<()>;
}

/// Clamp a server-provided offset into `[0, duration]`; garbage becomes 0
pub fn sanitize_position(position: f64, duration: f64) -> f64 {
    if !position.is_finite() || position < 0.0 {
        return 0.0;
    }
    if duration > 0.0 {
        position.min(duration)
    } else {
        position
    }
}
