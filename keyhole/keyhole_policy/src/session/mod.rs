//! Authentication session.
//!
//! A `Session` holds the current principal, its roles and the secure-markup
//! configuration. It is an explicit context object: evaluators, enforcers
//! and routers are built around an `Arc<Session>`, so independent sessions
//! can coexist. `Session::global()` returns a shared process-wide default.
//!
//! Login and logout notify subscribed observers (typically the router
//! registry) after the new state has been fully written, synchronously and
//! in subscription order.

mod credential;

pub use credential::{AuthState, Credential};

use keyhole_core::error::{Result, SessionError};
use keyhole_core::id::SessionId;
use keyhole_core::types::roles::RoleSet;
use keyhole_core::utils::config::{SecureConfig, SecureOptions};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

static GLOBAL_SESSION: Lazy<Arc<Session>> = Lazy::new(|| Arc::new(Session::new()));

/// Something that must react when a session logs in or out.
pub trait SessionObserver: Send + Sync {
    /// Called after the session's authentication state has changed.
    fn session_changed(&self, session: &Session);
}

/// Authentication and authorization state for one principal at a time.
pub struct Session {
    id: SessionId,
    state: RwLock<AuthState>,
    config: RwLock<SecureConfig>,
    observers: RwLock<Vec<Weak<dyn SessionObserver>>>,
}

impl Session {
    /// Create an anonymous session with the default configuration.
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            state: RwLock::new(AuthState::Anonymous),
            config: RwLock::new(SecureConfig::default()),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Create an anonymous session with a specific configuration.
    pub fn with_config(config: SecureConfig) -> Result<Self> {
        config.validate()?;
        let session = Self::new();
        *session.config.write() = config;
        Ok(session)
    }

    /// The shared process-wide session.
    pub fn global() -> Arc<Session> {
        GLOBAL_SESSION.clone()
    }

    /// The session's identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Log a principal in.
    ///
    /// # Errors
    ///
    /// `SessionError::AuthenticationFailed` if no credential is given; the
    /// session is left unchanged.
    pub fn authenticate(&self, credential: Option<Credential>) -> Result<()> {
        let credential = credential.ok_or(SessionError::AuthenticationFailed)?;
        info!(
            session = %self.id,
            principal = %credential.principal,
            roles = %credential.roles,
            "Principal authenticated"
        );
        *self.state.write() = credential.into();
        self.notify();
        Ok(())
    }

    /// Log out, returning to the anonymous state.
    pub fn invalidate(&self) {
        let previous = std::mem::take(&mut *self.state.write());
        if let Some(principal) = previous.principal() {
            info!(session = %self.id, principal, "Session invalidated");
        }
        self.notify();
    }

    /// Merge configuration options into the current configuration.
    ///
    /// Options left unset keep their current value. Nothing changes if the
    /// merged configuration is invalid.
    pub fn configure(&self, options: &SecureOptions) -> Result<()> {
        let mut config = self.config.write();
        let merged = config.merged(options)?;
        debug!(session = %self.id, ?merged, "Session configured");
        *config = merged;
        Ok(())
    }

    /// Merge options given as a loose JSON object; unknown keys are ignored.
    pub fn configure_from_value(&self, options: serde_json::Value) -> Result<()> {
        let options = SecureOptions::from_value(options)?;
        self.configure(&options)
    }

    /// Subscribe to login/logout notifications.
    ///
    /// The session keeps only a weak reference; observers that have been
    /// dropped are pruned on the next notification.
    pub fn subscribe<O>(&self, observer: &Arc<O>)
    where
        O: SessionObserver + 'static,
    {
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn SessionObserver> = weak;
        self.observers.write().push(weak);
    }

    /// Whether a principal is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    /// The logged-in principal, if any.
    pub fn principal(&self) -> Option<String> {
        self.state.read().principal().map(str::to_string)
    }

    /// The roles held, if authenticated.
    pub fn roles(&self) -> Option<RoleSet> {
        self.state.read().roles().cloned()
    }

    /// A copy of the current authentication state.
    pub fn snapshot(&self) -> AuthState {
        self.state.read().clone()
    }

    /// Run `f` against the current state without copying it.
    pub fn with_state<R>(&self, f: impl FnOnce(&AuthState) -> R) -> R {
        f(&self.state.read())
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> SecureConfig {
        self.config.read().clone()
    }

    fn notify(&self) {
        let live: Vec<Arc<dyn SessionObserver>> = {
            let mut observers = self.observers.write();
            observers.retain(|observer| observer.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        debug!(session = %self.id, observers = live.len(), "Notifying session observers");
        for observer in live {
            observer.session_changed(self);
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &*self.state.read())
            .field("config", &*self.config.read())
            .field("observers", &self.observers.read().len())
            .finish()
    }
}
