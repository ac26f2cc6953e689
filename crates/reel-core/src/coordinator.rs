//! Playback Session Coordinator - orchestrator for one watch session
//!
//! Coordinates:
//! - Token acquisition, then manifest resolution, strictly in that order
//! - Best-effort resume position and quality catalog lookups
//! - The progress reporting interval
//! - Completion reporting and teardown
//!
//! Session state lives behind a synchronous mutex so teardown can run from
//! `Drop`. No lock is held across an `.await`; every async result is applied
//! only if the session that issued it is still the active one.

use crate::{
    config::PlaybackConfig,
    progress::{PendingReport, ProgressReporter, Tick},
    services::{
        acquire_token, default_quality, resolve_manifest, sanitize_position, PlaybackServices,
    },
    state::{SessionPhase, SessionSnapshot},
    types::select_variant,
    ContentId, Error, PlaybackToken, ProfileId, ProgressReport, Quality, Result, SessionId,
    StreamManifest, StreamVariant,
};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn, Instrument};
use url::Url;

/// What a call to [`PlaybackCoordinator::initialize`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Session reached `ready`
    Ready,
    /// A session for the same content and profile is already running; nothing was done
    AlreadyActive,
    /// No resolved content item yet; show loading
    AwaitingContent,
    /// No profile selected; the viewer has to pick one first
    ProfileRequired,
    /// The session was torn down while a request was in flight
    Superseded,
}

/// State of the one active watch session
struct ActiveSession {
    id: SessionId,
    content_id: ContentId,
    profile_id: ProfileId,
    phase: SessionPhase,
    token: Option<PlaybackToken>,
    title: Option<String>,
    stream_variants: Vec<StreamVariant>,
    duration: f64,
    qualities: Vec<Quality>,
    quality_switch_enabled: bool,
    selected_quality: Option<String>,
    resume_position: f64,
    resume_seeded: bool,
    /// Start offset is final; the store value can no longer change it
    resume_settled: bool,
    /// Player clock as last reported
    position: f64,
    clock_started: bool,
    playing: bool,
    completed: bool,
    last_error: Option<String>,
    reporter: Option<ProgressReporter>,
}

impl ActiveSession {
    fn new(content_id: ContentId, profile_id: ProfileId) -> Self {
        Self {
            id: SessionId::new(),
            content_id,
            profile_id,
            phase: SessionPhase::Idle,
            token: None,
            title: None,
            stream_variants: Vec::new(),
            duration: 0.0,
            qualities: Vec::new(),
            quality_switch_enabled: false,
            selected_quality: None,
            resume_position: 0.0,
            resume_seeded: false,
            resume_settled: false,
            position: 0.0,
            clock_started: false,
            playing: true,
            completed: false,
            last_error: None,
            reporter: None,
        }
    }

    fn set_phase(&mut self, next: SessionPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(Error::InvalidPhaseTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }

        info!(session_id = %self.id, from = %self.phase, to = %next, "Phase transition");
        self.phase = next;
        if next != SessionPhase::Error {
            self.last_error = None;
        }
        Ok(())
    }

    fn fail(&mut self, err: &Error) {
        if self.phase.can_transition_to(SessionPhase::Error) {
            let _ = self.set_phase(SessionPhase::Error);
        }
        self.last_error = Some(err.to_string());
        self.release();
    }

    fn apply_manifest(&mut self, manifest: StreamManifest) -> Result<()> {
        if !manifest.token.is_empty() {
            self.token = Some(manifest.playback_token());
        }
        if let Some(position) = manifest.resume_position {
            self.resume_position = position;
            self.resume_seeded = true;
            self.resume_settled = true;
        }
        self.position = self.resume_position;
        self.duration = manifest.duration;
        self.title = Some(manifest.title).filter(|t| !t.is_empty());
        self.stream_variants = manifest.variants;
        self.set_phase(SessionPhase::Ready)
    }

    fn apply_qualities(&mut self, qualities: Vec<Quality>) {
        self.selected_quality = default_quality(self.selected_quality.as_deref(), &qualities);
        self.quality_switch_enabled = !qualities.is_empty();
        self.qualities = qualities;
    }

    /// Seed the start offset from the resume store, unless the manifest already
    /// did or the player clock is running
    fn seed_resume(&mut self, position: f64) {
        self.resume_settled = true;
        if self.resume_seeded || self.clock_started {
            debug!(
                session_id = %self.id,
                stored = position,
                primed = self.resume_position,
                "Resume position already primed, ignoring store value"
            );
            return;
        }
        self.resume_position = sanitize_position(position, self.duration);
        self.position = self.resume_position;
        self.resume_seeded = true;
    }

    fn stream_url(&self) -> Option<Url> {
        select_variant(&self.stream_variants, self.selected_quality.as_deref())
            .map(|v| v.url.clone())
    }

    fn knows_quality(&self, label: &str) -> bool {
        if self.qualities.is_empty() {
            self.stream_variants.iter().any(|v| v.quality == label)
        } else {
            self.qualities.iter().any(|q| q.quality == label)
        }
    }

    fn next_tick(&self) -> Tick {
        if self.completed || self.phase != SessionPhase::Ready {
            return Tick::Stop;
        }
        let Some(token) = self.token.clone() else {
            return Tick::Stop;
        };
        if !self.playing {
            return Tick::Skip;
        }
        Tick::Report(PendingReport {
            token,
            report: ProgressReport {
                position: self.position,
                duration: self.duration,
                quality: self.selected_quality.clone(),
            },
        })
    }

    /// Stop reporting and forget the token
    fn release(&mut self) {
        if let Some(reporter) = self.reporter.take() {
            reporter.stop();
        }
        self.token = None;
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: Some(self.id),
            content_id: Some(self.content_id.clone()),
            profile_id: Some(self.profile_id.clone()),
            phase: self.phase,
            title: self.title.clone(),
            stream_url: self.stream_url(),
            duration: (self.phase == SessionPhase::Ready).then_some(self.duration),
            resume_position: self.resume_position,
            resume_settled: self.resume_settled,
            qualities: self.qualities.clone(),
            quality_switch_enabled: self.quality_switch_enabled,
            current_quality: self.selected_quality.clone(),
            error: self.last_error.clone(),
        }
    }
}

/// Session slot plus the broadcaster observers read from
struct Shared {
    active: Mutex<Option<ActiveSession>>,
    state_tx: watch::Sender<SessionSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: Option<&ActiveSession>) {
        let snapshot = session.map(ActiveSession::snapshot).unwrap_or_default();
        self.state_tx.send_replace(snapshot);
    }

    /// Run `f` against the session only if `id` is still the active one,
    /// then publish the new snapshot
    fn update<T>(&self, id: SessionId, f: impl FnOnce(&mut ActiveSession) -> T) -> Option<T> {
        let mut guard = self.lock();
        let session = guard.as_mut().filter(|s| s.id == id)?;
        let out = f(session);
        self.publish(guard.as_ref());
        Some(out)
    }

    fn next_tick(&self, id: SessionId) -> Tick {
        match self.lock().as_ref() {
            Some(session) if session.id == id => session.next_tick(),
            _ => Tick::Stop,
        }
    }

    fn end_session(&self, id: Option<SessionId>) -> bool {
        let mut guard = self.lock();
        let matches = match (guard.as_ref(), id) {
            (Some(session), Some(id)) => session.id == id,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !matches {
            return false;
        }

        if let Some(mut session) = guard.take() {
            session.release();
            info!(
                session_id = %session.id,
                content_id = %session.content_id,
                phase = %session.phase,
                "Session torn down"
            );
        }
        self.publish(None);
        true
    }
}

/// Runs one watch session at a time over the playback services
pub struct PlaybackCoordinator {
    services: PlaybackServices,
    config: PlaybackConfig,
    shared: Arc<Shared>,
}

impl PlaybackCoordinator {
    /// Create a coordinator with no active session
    pub fn new(services: PlaybackServices, config: PlaybackConfig) -> Self {
        let (state_tx, _) = watch::channel(SessionSnapshot::default());
        Self {
            services,
            config,
            shared: Arc::new(Shared {
                active: Mutex::new(None),
                state_tx,
            }),
        }
    }

    /// Current session state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.state_tx.borrow().clone()
    }

    /// Subscribe to session state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.state_tx.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.shared.state_tx.borrow().phase
    }

    /// True while a reporting interval exists for the active session
    pub fn is_reporting(&self) -> bool {
        self.shared
            .lock()
            .as_ref()
            .and_then(|s| s.reporter.as_ref())
            .is_some_and(ProgressReporter::is_running)
    }

    /// Start a watch session for `content_id` as `profile_id`.
    ///
    /// Nothing happens until both are known. Fatal token and manifest
    /// failures move the session to `error` and are returned; the caller is
    /// expected to route back to the content detail view after
    /// [`PlaybackConfig::error_redirect_delay`].
    #[instrument(skip(self))]
    pub async fn initialize(
        &self,
        content_id: Option<ContentId>,
        profile_id: Option<ProfileId>,
    ) -> Result<InitOutcome> {
        let Some(content_id) = content_id else {
            debug!("Content not resolved yet");
            return Ok(InitOutcome::AwaitingContent);
        };
        let Some(profile_id) = profile_id else {
            debug!("No profile selected");
            return Ok(InitOutcome::ProfileRequired);
        };

        let id = {
            let mut guard = self.shared.lock();

            if let Some(current) = guard.as_ref() {
                if current.content_id == content_id
                    && current.profile_id == profile_id
                    && current.phase != SessionPhase::Error
                {
                    debug!(session_id = %current.id, phase = %current.phase, "Session already active");
                    return Ok(InitOutcome::AlreadyActive);
                }
            }

            // Sessions are disjoint: whatever was there goes first
            if let Some(mut previous) = guard.take() {
                debug!(session_id = %previous.id, "Replacing previous session");
                previous.release();
            }

            let mut session = ActiveSession::new(content_id.clone(), profile_id.clone());
            session.set_phase(SessionPhase::AcquiringToken)?;
            let id = session.id;
            *guard = Some(session);
            self.shared.publish(guard.as_ref());
            id
        };

        let token = match self
            .deadline(
                "RequestToken",
                acquire_token(self.services.tokens.as_ref(), &profile_id, &content_id),
            )
            .await
        {
            Ok(token) => token,
            Err(err) => return self.fail(id, err),
        };

        match self.shared.update(id, |s| {
            s.token = Some(token.clone());
            s.set_phase(SessionPhase::ResolvingManifest)
        }) {
            Some(result) => result?,
            None => return Ok(self.superseded(id)),
        }

        let manifest = match self
            .deadline(
                "GetManifest",
                resolve_manifest(self.services.manifests.as_ref(), &token),
            )
            .await
        {
            Ok(manifest) => manifest,
            Err(err) => return self.fail(id, err),
        };

        match self.shared.update(id, |s| s.apply_manifest(manifest)) {
            Some(result) => result?,
            None => return Ok(self.superseded(id)),
        }

        self.spawn_lookups(id, content_id, profile_id);
        Ok(InitOutcome::Ready)
    }

    /// Feed the player clock. Starts the reporting interval on first use.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn report_time(&self, current_seconds: f64) {
        let mut guard = self.shared.lock();
        let Some(session) = guard.as_mut() else {
            return;
        };
        if session.phase != SessionPhase::Ready || session.token.is_none() || session.completed {
            return;
        }

        session.position = sanitize_position(current_seconds, session.duration);
        session.clock_started = true;

        if session.reporter.is_none() {
            debug!(session_id = %session.id, "Starting progress reporter");
            let id = session.id;
            let shared = Arc::downgrade(&self.shared);
            session.reporter = Some(ProgressReporter::spawn(
                self.config.progress_interval(),
                self.services.resume.clone(),
                move || next_tick(&shared, id),
            ));
        }
    }

    /// Player paused; periodic reports are skipped until playback resumes
    pub fn handle_pause(&self) {
        if let Some(session) = self.shared.lock().as_mut() {
            session.playing = false;
        }
    }

    /// Player resumed
    pub fn handle_play(&self) {
        if let Some(session) = self.shared.lock().as_mut() {
            session.playing = true;
        }
    }

    /// Switch to another quality from the catalog
    #[instrument(skip(self))]
    pub fn change_quality(&self, label: &str) -> Result<()> {
        let mut guard = self.shared.lock();
        let session = guard
            .as_mut()
            .filter(|s| s.phase == SessionPhase::Ready)
            .ok_or(Error::NoActiveSession)?;

        if !session.knows_quality(label) {
            return Err(Error::UnknownQuality(label.to_string()));
        }

        info!(session_id = %session.id, from = ?session.selected_quality, to = label, "Quality changed");
        session.selected_quality = Some(label.to_string());
        self.shared.publish(guard.as_ref());
        Ok(())
    }

    /// Content reached its end: report 100% completion, then tear down.
    ///
    /// A failed completion report is logged and otherwise ignored.
    #[instrument(skip(self))]
    pub async fn handle_ended(&self) -> Result<()> {
        let (id, token, report) = {
            let mut guard = self.shared.lock();
            let session = guard
                .as_mut()
                .filter(|s| s.phase == SessionPhase::Ready && !s.completed)
                .ok_or(Error::NoActiveSession)?;

            session.completed = true;
            if let Some(reporter) = session.reporter.take() {
                reporter.stop();
            }
            let token = session.token.clone().ok_or(Error::NoActiveSession)?;
            let report =
                ProgressReport::completed(session.duration, session.selected_quality.clone());
            (session.id, token, report)
        };

        if token.is_expired() {
            warn!(session_id = %id, "Playback token expired, completion not reported");
        } else {
            match self.services.resume.put_progress(&token, &report).await {
                Ok(()) => info!(session_id = %id, duration = report.duration, "Completion reported"),
                Err(err) => {
                    warn!(session_id = %id, error = %err, code = err.error_code(), "Completion report failed")
                }
            }
        }

        self.shared.end_session(Some(id));
        Ok(())
    }

    /// Viewer navigated away: stop reporting and clear the token, whatever the phase
    pub fn teardown(&self) {
        self.shared.end_session(None);
    }

    async fn deadline<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match self.config.request_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| Error::Timeout { operation })?,
            None => call.await,
        }
    }

    fn fail(&self, id: SessionId, err: Error) -> Result<InitOutcome> {
        match self.shared.update(id, |s| s.fail(&err)) {
            Some(()) => {
                error!(session_id = %id, error = %err, code = err.error_code(), "Playback session failed");
                Err(err)
            }
            None => {
                debug!(session_id = %id, error = %err, "Ignoring failure of torn-down session");
                Ok(InitOutcome::Superseded)
            }
        }
    }

    fn superseded(&self, id: SessionId) -> InitOutcome {
        debug!(session_id = %id, "Session torn down while in flight");
        InitOutcome::Superseded
    }

    /// Fire-and-forget resume position and quality catalog fetches
    fn spawn_lookups(&self, id: SessionId, content_id: ContentId, profile_id: ProfileId) {
        let catalog = self.services.qualities.clone();
        let shared = Arc::downgrade(&self.shared);
        let content = content_id.clone();
        tokio::spawn(
            async move {
                let result = catalog.get_qualities(&content).await;
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                let applied = match result {
                    Ok(qualities) => {
                        debug!(count = qualities.len(), "Quality catalog loaded");
                        shared.update(id, |s| s.apply_qualities(qualities))
                    }
                    Err(err) => {
                        let err = Error::non_fatal("GetQualities", &err);
                        warn!(error = %err, "Quality switching disabled");
                        shared.update(id, |s| s.quality_switch_enabled = false)
                    }
                };
                if applied.is_none() {
                    debug!("Quality catalog arrived after teardown");
                }
            }
            .instrument(tracing::debug_span!("quality_catalog", session_id = %id)),
        );

        let store = self.services.resume.clone();
        let shared = Arc::downgrade(&self.shared);
        tokio::spawn(
            async move {
                let result = store.get_position(&content_id, &profile_id).await;
                let Some(shared) = shared.upgrade() else {
                    return;
                };
                let applied = match result {
                    Ok(position) => shared.update(id, |s| s.seed_resume(position)),
                    Err(err) => {
                        let err = Error::non_fatal("GetResumePosition", &err);
                        warn!(error = %err, "Starting without stored resume position");
                        shared.update(id, |s| s.resume_settled = true)
                    }
                };
                if applied.is_none() {
                    debug!("Resume position arrived after teardown");
                }
            }
            .instrument(tracing::debug_span!("resume_position", session_id = %id)),
        );
    }
}

fn next_tick(shared: &Weak<Shared>, id: SessionId) -> Tick {
    match shared.upgrade() {
        Some(shared) => shared.next_tick(id),
        None => Tick::Stop,
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}
