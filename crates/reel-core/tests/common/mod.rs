//! Scripted in-memory playback API shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reel_core::{
    ContentId, Error, ManifestResolver, PlaybackServices, PlaybackToken, ProfileId,
    ProgressReport, Quality, QualityCatalog, Result, ResumePositionStore, StreamManifest,
    StreamVariant, TokenService,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

/// Recorded API call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RequestToken { profile_id: String, content_id: String },
    TokenSettled,
    GetManifest { token: String },
    GetQualities { content_id: String },
    GetResumePosition { content_id: String, profile_id: String },
    PutProgress { token: String, report: ProgressReport },
}

/// How a scripted call settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    Deny,
    Unavailable,
    ServerError,
}

impl Outcome {
    fn check(self, operation: &'static str) -> Result<()> {
        match self {
            Outcome::Succeed => Ok(()),
            Outcome::Deny => Err(Error::Authorization("profile not entitled".into())),
            Outcome::Unavailable => Err(Error::Manifest("no ready renditions".into())),
            Outcome::ServerError => Err(Error::Status {
                operation,
                status: 503,
                message: "upstream unavailable".into(),
            }),
        }
    }
}

pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    pub token_outcome: Mutex<Outcome>,
    pub manifest_outcome: Mutex<Outcome>,
    pub qualities_outcome: Mutex<Outcome>,
    pub resume_outcome: Mutex<Outcome>,
    pub put_outcome: Mutex<Outcome>,
    /// When set, the token call waits for a notification before settling
    pub token_gate: Mutex<Option<Arc<Notify>>>,
    /// When set, the manifest call waits for a notification before settling
    pub manifest_gate: Mutex<Option<Arc<Notify>>>,
    pub token_latency: Duration,
    pub resume_latency: Duration,
    pub manifest: StreamManifest,
    pub qualities: Vec<Quality>,
    pub stored_position: f64,
}

impl FakeApi {
    /// Content 42 with a 1080p and a 720p variant, resume at 125s of 5400s
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            token_outcome: Mutex::new(Outcome::Succeed),
            manifest_outcome: Mutex::new(Outcome::Succeed),
            qualities_outcome: Mutex::new(Outcome::Succeed),
            resume_outcome: Mutex::new(Outcome::Succeed),
            put_outcome: Mutex::new(Outcome::Succeed),
            token_gate: Mutex::new(None),
            manifest_gate: Mutex::new(None),
            token_latency: Duration::ZERO,
            resume_latency: Duration::ZERO,
            manifest: StreamManifest {
                content_id: ContentId::new("42"),
                title: "The Example".into(),
                variants: vec![
                    variant("1080p", "https://cdn/42/1080p.m3u8"),
                    variant("720p", "https://cdn/42/720p.m3u8"),
                ],
                resume_position: Some(125.0),
                duration: 5400.0,
                token: "tok_abc".into(),
                expires_at: Utc::now() + ChronoDuration::hours(1),
            },
            qualities: vec![
                quality("1080p", "1920x1080", "2.4 GB"),
                quality("720p", "1280x720", "1.1 GB"),
            ],
            stored_position: 0.0,
        }
    }

    pub fn with_token(self, outcome: Outcome) -> Self {
        *self.token_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_manifest(self, outcome: Outcome) -> Self {
        *self.manifest_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_qualities(self, outcome: Outcome) -> Self {
        *self.qualities_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_resume(self, outcome: Outcome) -> Self {
        *self.resume_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_put(self, outcome: Outcome) -> Self {
        *self.put_outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_token_latency(mut self, latency: Duration) -> Self {
        self.token_latency = latency;
        self
    }

    pub fn with_resume_latency(mut self, latency: Duration) -> Self {
        self.resume_latency = latency;
        self
    }

    /// Token re-issued with the manifest expires `expires_in` from now
    pub fn with_manifest_expiry(mut self, expires_in: ChronoDuration) -> Self {
        self.manifest.expires_at = Utc::now() + expires_in;
        self
    }

    pub fn with_resume_position(mut self, manifest: Option<f64>, stored: f64) -> Self {
        self.manifest.resume_position = manifest;
        self.stored_position = stored;
        self
    }

    /// Hold the manifest call until the returned handle is notified
    pub fn gate_manifest(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.manifest_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold the token call until the returned handle is notified
    pub fn gate_token(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.token_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn set_token(&self, outcome: Outcome) {
        *self.token_outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<(String, ProgressReport)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::PutProgress { token, report } => Some((token, report)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn variant(quality: &str, url: &str) -> StreamVariant {
    StreamVariant {
        quality: quality.into(),
        resolution: None,
        url: Url::parse(url).unwrap(),
    }
}

pub fn quality(label: &str, resolution: &str, size: &str) -> Quality {
    Quality {
        quality: label.into(),
        resolution: Some(resolution.into()),
        file_size: Some(size.into()),
    }
}

pub fn services(api: &Arc<FakeApi>) -> PlaybackServices {
    PlaybackServices::from_api(api.clone())
}

#[async_trait]
impl TokenService for FakeApi {
    async fn request_token(
        &self,
        profile_id: &ProfileId,
        content_id: &ContentId,
    ) -> Result<PlaybackToken> {
        self.record(Call::RequestToken {
            profile_id: profile_id.to_string(),
            content_id: content_id.to_string(),
        });

        if !self.token_latency.is_zero() {
            tokio::time::sleep(self.token_latency).await;
        }
        let gate = self.token_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let outcome = *self.token_outcome.lock().unwrap();
        self.record(Call::TokenSettled);
        outcome.check("RequestToken")?;
        Ok(PlaybackToken::new("tok_abc", Utc::now() + ChronoDuration::hours(1)))
    }
}

#[async_trait]
impl ManifestResolver for FakeApi {
    async fn get_manifest(&self, token: &PlaybackToken) -> Result<StreamManifest> {
        self.record(Call::GetManifest {
            token: token.as_str().to_string(),
        });

        let gate = self.manifest_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let outcome = *self.manifest_outcome.lock().unwrap();
        outcome.check("GetManifest")?;
        Ok(self.manifest.clone())
    }
}

#[async_trait]
impl QualityCatalog for FakeApi {
    async fn get_qualities(&self, content_id: &ContentId) -> Result<Vec<Quality>> {
        self.record(Call::GetQualities {
            content_id: content_id.to_string(),
        });
        let outcome = *self.qualities_outcome.lock().unwrap();
        outcome.check("GetQualities")?;
        Ok(self.qualities.clone())
    }
}

#[async_trait]
impl ResumePositionStore for FakeApi {
    async fn get_position(&self, content_id: &ContentId, profile_id: &ProfileId) -> Result<f64> {
        self.record(Call::GetResumePosition {
            content_id: content_id.to_string(),
            profile_id: profile_id.to_string(),
        });
        if !self.resume_latency.is_zero() {
            tokio::time::sleep(self.resume_latency).await;
        }
        let outcome = *self.resume_outcome.lock().unwrap();
        outcome.check("GetResumePosition")?;
        Ok(self.stored_position)
    }

    async fn put_progress(&self, token: &PlaybackToken, report: &ProgressReport) -> Result<()> {
        self.record(Call::PutProgress {
            token: token.as_str().to_string(),
            report: report.clone(),
        });
        let outcome = *self.put_outcome.lock().unwrap();
        outcome.check("PutProgress")
    }
}
