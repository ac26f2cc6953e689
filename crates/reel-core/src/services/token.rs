//! Session Token Service

use crate::{ContentId, Error, PlaybackToken, ProfileId, Result};
use async_trait::async_trait;

/// Authorizes one profile to stream one content item
#[async_trait]
pub trait TokenService: Send + Sync {
    /// RequestToken `{profileId, contentId}` -> `{token, expiresAt}`
    async fn request_token(
        &self,
        profile_id: &ProfileId,
        content_id: &ContentId,
    ) -> Result<PlaybackToken>;
}

/// Request a token and reject grants that are unusable on arrival
pub async fn acquire_token(
    service: &dyn TokenService,
    profile_id: &ProfileId,
    content_id: &ContentId,
) -> Result<PlaybackToken> {
    let token = service.request_token(profile_id, content_id).await?;

    if token.token.is_empty() {
        return Err(Error::Authorization("empty playback token".to_string()));
    }
    if token.is_expired() {
        return Err(Error::TokenExpired);
    }

    Ok(token)
}
