//! Manifest Resolver

use crate::{Error, PlaybackToken, Result, StreamManifest};
use async_trait::async_trait;

/// Exchanges a playback token for a stream descriptor
#[async_trait]
pub trait ManifestResolver: Send + Sync {
    /// GetManifest `{token}` -> stream descriptor
    async fn get_manifest(&self, token: &PlaybackToken) -> Result<StreamManifest>;
}

/// Resolve a manifest, refusing expired tokens and assets without renditions
pub async fn resolve_manifest(
    resolver: &dyn ManifestResolver,
    token: &PlaybackToken,
) -> Result<StreamManifest> {
    if token.is_expired() {
        return Err(Error::Manifest("playback token expired".to_string()));
    }

    let mut manifest = resolver.get_manifest(token).await?;

    if manifest.variants.is_empty() {
        return Err(Error::Manifest(format!(
            "content {} has no ready renditions",
            manifest.content_id
        )));
    }
    if !manifest.duration.is_finite() || manifest.duration < 0.0 {
        return Err(Error::Manifest(format!(
            "invalid duration {}",
            manifest.duration
        )));
    }
    manifest.resume_position = manifest
        .resume_position
        .map(|p| super::sanitize_position(p, manifest.duration));

    Ok(manifest)
}
