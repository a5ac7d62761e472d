//! The one persistent browser session and its login state machine.

use crate::config::{SiteConfig, TimingConfig};
use crate::pacing::Pacer;
use crate::service::ServiceError;
use redscout_common::records::LoginOutcome;
use redscout_common::{Backend, BackendError, Locator};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Builds the backend the first time a session is needed.
pub type BackendFactory = Box<dyn Fn() -> Box<dyn Backend> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    AwaitingLogin,
    Ready,
}

pub struct Session {
    state: SessionState,
    backend: Box<dyn Backend>,
    login_deadline: Option<Instant>,
}

impl Session {
    fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            state: SessionState::Uninitialized,
            backend,
            login_deadline: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn login_deadline(&self) -> Option<Instant> {
        self.login_deadline
    }

    pub fn backend(&mut self) -> &mut dyn Backend {
        self.backend.as_mut()
    }
}

pub struct SessionManager {
    factory: BackendFactory,
    slot: Mutex<Option<Session>>,
    site: SiteConfig,
    timing: TimingConfig,
    pacer: Pacer,
}

impl SessionManager {
    pub fn new(
        factory: BackendFactory,
        site: SiteConfig,
        timing: TimingConfig,
        pacer: Pacer,
    ) -> Self {
        Self {
            factory,
            slot: Mutex::new(None),
            site,
            timing,
            pacer,
        }
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Lock the session, launching the backend on first use.
    ///
    /// The lock is held for the lifetime of the guard, so callers are
    /// serialized and concurrent first calls construct exactly one backend.
    pub async fn acquire(&self) -> Result<MappedMutexGuard<'_, Session>, BackendError> {
        let mut slot = self.slot.lock().await;
        if slot.is_none() {
            let mut backend = (self.factory)();
            backend.launch().await?;
            info!("Browser session launched");
            *slot = Some(Session::new(backend));
        }
        MutexGuard::try_map(slot, |s| s.as_mut()).map_err(|_| BackendError::NotReady)
    }

    /// Close the backend if one was ever launched.
    pub async fn shutdown(&self) -> Result<(), BackendError> {
        let mut slot = self.slot.lock().await;
        if let Some(mut session) = slot.take() {
            session.backend.close().await?;
            info!("Browser session closed");
        }
        Ok(())
    }

    /// Whether the session is logged in. Once `Ready` this never touches the page.
    pub async fn ensure_ready(&self, session: &mut Session) -> Result<bool, ServiceError> {
        if session.state == SessionState::Ready {
            return Ok(true);
        }

        if self.login_affordance_present(session).await? {
            session.state = SessionState::AwaitingLogin;
            debug!("Login affordance present, awaiting login");
            Ok(false)
        } else {
            session.state = SessionState::Ready;
            info!("Session is logged in");
            Ok(true)
        }
    }

    /// Open the login dialog and wait for the user to finish logging in.
    pub async fn login(&self, session: &mut Session) -> Result<LoginOutcome, ServiceError> {
        if session.state == SessionState::Ready {
            return Ok(LoginOutcome::AlreadyLoggedIn);
        }

        self.open_root(session).await?;
        let affordance = session
            .backend
            .query(&self.login_locator(), None)
            .await?;
        let Some(affordance) = affordance else {
            session.state = SessionState::Ready;
            return Ok(LoginOutcome::AlreadyLoggedIn);
        };

        session.state = SessionState::AwaitingLogin;
        session.backend.click(&affordance).await?;
        session.login_deadline = Some(Instant::now() + self.timing.login_ceiling());
        info!(
            ceiling_ms = self.timing.login_ceiling_ms,
            "Complete the login in the browser window"
        );

        let outcome = self.poll_login(session).await?;
        session.login_deadline = None;
        Ok(outcome)
    }

    /// Check, then wait one interval, `ceiling / interval` times.
    async fn poll_login(&self, session: &mut Session) -> Result<LoginOutcome, ServiceError> {
        let interval = self.timing.login_poll_interval();
        let polls = if interval.is_zero() {
            1
        } else {
            (self.timing.login_ceiling().as_millis() / interval.as_millis()).max(1) as u64
        };

        for poll in 1..=polls {
            let still_present = match session.backend.query(&self.login_locator(), None).await {
                Ok(found) => found.is_some(),
                Err(e) => {
                    warn!(poll, error = %e, "Login check failed");
                    true
                }
            };
            if !still_present {
                session.state = SessionState::Ready;
                info!(poll, "Login completed");
                self.pacer.settle(self.timing.post_login_settle()).await?;
                return Ok(LoginOutcome::Succeeded);
            }
            debug!(poll, polls, "Still waiting for login");
            self.pacer.settle(interval).await?;
        }

        warn!("Login wait timed out");
        Ok(LoginOutcome::TimedOut)
    }

    async fn login_affordance_present(&self, session: &mut Session) -> Result<bool, ServiceError> {
        self.open_root(session).await?;
        let found = session
            .backend
            .query(&self.login_locator(), None)
            .await?;
        Ok(found.is_some())
    }

    async fn open_root(&self, session: &mut Session) -> Result<(), ServiceError> {
        session
            .backend
            .navigate(&self.site.root_url, self.timing.navigation_timeout())
            .await
            .map_err(ServiceError::Navigation)?;
        self.pacer.settle(self.timing.root_settle()).await?;
        Ok(())
    }

    fn login_locator(&self) -> Locator {
        Locator::text(&self.site.login_text)
    }
}
