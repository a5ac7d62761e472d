//! The operation surface: every public operation gets a ready session, puts
//! it on the target page, then reads or writes through the engines.

use crate::actions::{ActionDispatcher, ActionRequest};
use crate::analysis::{self, NoteAnalysis, SmartCommentBrief};
use crate::comments::CommentCollector;
use crate::config::RedscoutConfig;
use crate::extraction;
use crate::navigation::NavigationController;
use crate::pacing::{Cancelled, Pacer};
use crate::scripts;
use crate::session::{BackendFactory, Session, SessionManager};
use redscout_common::BackendError;
use redscout_common::records::{
    ActionResult, CommentRecord, LoginOutcome, NoteRecord, SearchHit,
};
use thiserror::Error;
use tokio::sync::MappedMutexGuard;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("请先登录小红书账号")]
    NotLoggedIn,

    #[error("Navigation failed: {0}")]
    Navigation(BackendError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Operation cancelled")]
    Cancelled(#[from] Cancelled),
}

impl ServiceError {
    /// Stable machine-readable name, used in JSON responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotLoggedIn => "not_logged_in",
            ServiceError::Navigation(_) => "navigation",
            ServiceError::Backend(_) => "backend",
            ServiceError::Cancelled(_) => "cancelled",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Navigation(_) => true,
            ServiceError::Backend(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub struct NoteService {
    config: RedscoutConfig,
    sessions: SessionManager,
}

impl NoteService {
    pub fn new(config: RedscoutConfig, factory: BackendFactory, token: CancellationToken) -> Self {
        let sessions = SessionManager::new(
            factory,
            config.site.clone(),
            config.timing.clone(),
            Pacer::new(token),
        );
        Self { config, sessions }
    }

    pub fn config(&self) -> &RedscoutConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub async fn shutdown(&self) -> Result<(), BackendError> {
        self.sessions.shutdown().await
    }

    pub async fn login(&self) -> Result<LoginOutcome, ServiceError> {
        let mut session = self.sessions.acquire().await?;
        let outcome = self.sessions.login(&mut session).await?;
        info!(?outcome, "Login finished");
        Ok(outcome)
    }

    pub async fn search_notes(
        &self,
        keywords: &str,
        limit: usize,
        sort_by_time: bool,
    ) -> Result<Vec<SearchHit>, ServiceError> {
        let mut session = self.ready_session().await?;
        let backend = session.backend();
        let pacer = self.sessions.pacer();
        let timing = &self.config.timing;

        let url = extraction::search_url(&self.config.site, keywords);
        backend
            .navigate(&url, timing.navigation_timeout())
            .await
            .map_err(ServiceError::Navigation)?;
        pacer.settle(timing.page_settle()).await?;

        if sort_by_time {
            extraction::sort_by_latest(backend, pacer, timing).await?;
        }
        pacer.settle(timing.page_settle()).await?;

        let hits = extraction::collect_hits(backend, &self.config.site, limit).await?;
        info!(keywords, count = hits.len(), "Search finished");
        Ok(hits)
    }

    pub async fn get_note_content(&self, url: &str) -> Result<NoteRecord, ServiceError> {
        let mut session = self.ready_session().await?;
        let backend = session.backend();
        let pacer = self.sessions.pacer();

        self.navigator().navigate_if_needed(backend, url).await?;

        if let Err(e) = backend.evaluate(scripts::SCROLL_THROUGH, Vec::new()).await {
            debug!(error = %e, "Scroll-through failed");
        }
        pacer.settle(self.config.timing.render_settle()).await?;

        Ok(extraction::extract_note(backend, url).await)
    }

    pub async fn get_note_comments(&self, url: &str) -> Result<Vec<CommentRecord>, ServiceError> {
        let mut session = self.ready_session().await?;
        let backend = session.backend();
        let navigator = self.navigator();

        navigator
            .navigate_if_needed(backend, &navigator.feed_url(url))
            .await?;

        let collector = CommentCollector::new(
            &self.config.comments,
            &self.config.timing,
            self.sessions.pacer(),
        );
        Ok(collector.collect(backend).await?)
    }

    pub async fn analyze_note(&self, url: &str) -> Result<NoteAnalysis, ServiceError> {
        let record = self.get_note_content(url).await?;
        Ok(analysis::analyze(&record))
    }

    /// Note analysis plus writing guidance; the comment itself is written by
    /// the caller and posted with `post_comment`.
    pub async fn post_smart_comment(
        &self,
        url: &str,
        comment_type: &str,
    ) -> Result<SmartCommentBrief, ServiceError> {
        let analysis = self.analyze_note(url).await?;
        Ok(analysis::smart_comment_brief(analysis, comment_type))
    }

    pub async fn post_comment(&self, url: &str, text: &str) -> Result<ActionResult, ServiceError> {
        self.dispatch(
            url,
            ActionRequest::Comment {
                text: text.to_string(),
            },
        )
        .await
    }

    pub async fn like_note(&self, url: &str) -> Result<ActionResult, ServiceError> {
        self.dispatch(url, ActionRequest::Like).await
    }

    pub async fn follow_user(&self, url: &str) -> Result<ActionResult, ServiceError> {
        self.dispatch(url, ActionRequest::Follow).await
    }

    async fn dispatch(
        &self,
        url: &str,
        request: ActionRequest,
    ) -> Result<ActionResult, ServiceError> {
        let mut session = self.ready_session().await?;
        let backend = session.backend();
        let navigator = self.navigator();

        navigator
            .navigate_if_needed(backend, &navigator.feed_url(url))
            .await?;

        let dispatcher = ActionDispatcher::new(&self.config.timing, self.sessions.pacer());
        Ok(dispatcher.execute(backend, &request).await?)
    }

    /// The locked session, or `NotLoggedIn` before anything touches the note.
    async fn ready_session(&self) -> Result<MappedMutexGuard<'_, Session>, ServiceError> {
        let mut session = self.sessions.acquire().await?;
        if !self.sessions.ensure_ready(&mut session).await? {
            return Err(ServiceError::NotLoggedIn);
        }
        Ok(session)
    }

    fn navigator(&self) -> NavigationController<'_> {
        NavigationController::new(
            &self.config.site,
            &self.config.timing,
            self.sessions.pacer(),
        )
    }
}
