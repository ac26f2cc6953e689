//! Service contracts consumed by the coordinator
//!
//! Each service is a stateless request/response seam over the remote API.
//! [`crate::http::HttpApi`] implements all of them; tests substitute fakes.

mod manifest;
mod quality;
mod resume;
mod token;

pub use manifest::{resolve_manifest, ManifestResolver};
pub use quality::{default_quality, QualityCatalog};
pub use resume::{sanitize_position, ResumePositionStore};
pub use token::{acquire_token, TokenService};

use std::sync::Arc;

/// The four services a playback session fans out to
#[derive(Clone)]
pub struct PlaybackServices {
    pub tokens: Arc<dyn TokenService>,
    pub manifests: Arc<dyn ManifestResolver>,
    pub qualities: Arc<dyn QualityCatalog>,
    pub resume: Arc<dyn ResumePositionStore>,
}

impl PlaybackServices {
    /// Use one implementation for every service
    pub fn from_api<A>(api: Arc<A>) -> Self
    where
        A: TokenService + ManifestResolver + QualityCatalog + ResumePositionStore + 'static,
    {
        Self {
            tokens: api.clone(),
            manifests: api.clone(),
            qualities: api.clone(),
            resume: api,
        }
    }
}
