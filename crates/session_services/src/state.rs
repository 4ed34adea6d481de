use std::sync::Arc;

use kheyma_api::CredentialProvider;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::identity::{Identity, Role, normalize};
use crate::navigation::{Navigator, Route};
use crate::store::{IDENTITY_KEY, KeyValueStore, TOKEN_KEY};

/// Bearer token paired with the identity it authenticates
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    /// Opaque bearer credential
    pub token: String,
    /// Normalized user
    pub identity: Identity,
}

/// Session state machine
///
/// `Bootstrapping → {Anonymous, Authenticated}`, `Authenticated → Anonymous`.
/// An identity only ever exists inside [`Credentials`], so there is no state
/// with an identity but no token.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Start-up; `cached` holds restored credentials while they are being validated
    Bootstrapping {
        /// Persisted credentials shown optimistically during validation
        cached: Option<Credentials>,
    },
    /// No session
    Anonymous,
    /// Validated session
    Authenticated(Credentials),
}

impl SessionState {
    /// Credentials in effect, including optimistic ones during bootstrap
    pub fn credentials(&self) -> Option<&Credentials> {
        match self {
            SessionState::Bootstrapping { cached } => cached.as_ref(),
            SessionState::Anonymous => None,
            SessionState::Authenticated(credentials) => Some(credentials),
        }
    }

    /// Current bearer token
    pub fn token(&self) -> Option<&str> {
        self.credentials().map(|c| c.token.as_str())
    }

    /// Current identity
    pub fn identity(&self) -> Option<&Identity> {
        self.credentials().map(|c| &c.identity)
    }

    /// Role of the current identity, `Guest` without one
    pub fn role(&self) -> Role {
        self.identity().map(|i| i.role).unwrap_or(Role::Guest)
    }

    /// True until bootstrap has settled
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Bootstrapping { .. })
    }

    /// True once a session has been validated or freshly established
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// True when settled without a session
    pub fn is_anonymous(&self) -> bool {
        matches!(self, SessionState::Anonymous)
    }
}

/// Process-wide session owner
///
/// Holds the state cell, the durable store and the navigator. It is shared
/// behind an `Arc` by the gateway (as its [`CredentialProvider`]), the
/// session manager and the checkout workflow. All mutations are synchronous.
pub struct SessionHandle {
    state: watch::Sender<SessionState>,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionHandle {
    /// Create a handle in `Bootstrapping` with nothing restored yet
    pub fn new(store: Arc<dyn KeyValueStore>, navigator: Arc<dyn Navigator>) -> Self {
        let (state, _) = watch::channel(SessionState::Bootstrapping { cached: None });
        Self {
            state,
            store,
            navigator,
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Navigator shared with other flows
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Wait until bootstrap has settled and return the settled state
    pub async fn wait_ready(&self) -> SessionState {
        let mut receiver = self.subscribe();
        match receiver.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Drop the session from memory and storage; safe to call in any state
    pub fn clear(&self) {
        self.state.send_replace(SessionState::Anonymous);
        self.purge();
    }

    /// Install freshly issued credentials
    pub(crate) fn establish(&self, credentials: Credentials) {
        self.persist(&credentials);
        info!(
            "Session established for {} ({})",
            credentials.identity.email, credentials.identity.role
        );
        self.state
            .send_replace(SessionState::Authenticated(credentials));
    }

    /// Replace the identity of the session that still holds `token`.
    /// Returns `false` when the session changed in the meantime.
    pub(crate) fn replace_identity(&self, token: &str, identity: Identity) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|state| {
            if state.token() != Some(token) {
                return false;
            }
            let credentials = Credentials {
                token: token.to_string(),
                identity: identity.clone(),
            };
            *state = SessionState::Authenticated(credentials);
            applied = true;
            true
        });

        if applied {
            self.persist_identity(&identity);
        }
        applied
    }

    /// Read persisted credentials; a half-written or corrupt entry pair is purged
    pub(crate) fn load_persisted(&self) -> Option<Credentials> {
        let token = self.read(TOKEN_KEY);
        let identity = self.read(IDENTITY_KEY);

        match (token, identity) {
            (Some(token), Some(identity)) if !token.trim().is_empty() => {
                match serde_json::from_str::<serde_json::Value>(&identity) {
                    Ok(raw) => Some(Credentials {
                        token,
                        identity: normalize(&raw),
                    }),
                    Err(e) => {
                        warn!("Discarding unreadable persisted identity: {}", e);
                        self.purge();
                        None
                    }
                }
            }
            (None, None) => None,
            _ => {
                debug!("Discarding incomplete persisted session");
                self.purge();
                None
            }
        }
    }

    /// Show restored credentials while they are validated
    pub(crate) fn begin_validation(&self, cached: Credentials) -> bool {
        self.state.send_if_modified(|state| match state {
            SessionState::Bootstrapping { cached: slot } => {
                *slot = Some(cached);
                true
            }
            _ => false,
        })
    }

    /// Settle bootstrap without a session unless a login already happened
    pub(crate) fn settle_anonymous(&self) {
        self.state.send_if_modified(|state| {
            if state.is_loading() {
                *state = SessionState::Anonymous;
                true
            } else {
                false
            }
        });
    }

    /// Drop the session if it still holds `token`
    pub(crate) fn abandon(&self, token: &str) {
        let still_current = self.state.borrow().token() == Some(token);
        if still_current {
            self.clear();
        } else {
            self.settle_anonymous();
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read session entry '{}': {}", key, e);
                None
            }
        }
    }

    fn persist(&self, credentials: &Credentials) {
        if let Err(e) = self.store.set(TOKEN_KEY, &credentials.token) {
            warn!("Failed to persist session token: {}", e);
        }
        self.persist_identity(&credentials.identity);
    }

    fn persist_identity(&self, identity: &Identity) {
        if let Err(e) = self
            .store
            .set(IDENTITY_KEY, &identity.to_value().to_string())
        {
            warn!("Failed to persist session identity: {}", e);
        }
    }

    fn purge(&self) {
        for key in [TOKEN_KEY, IDENTITY_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!("Failed to remove session entry '{}': {}", key, e);
            }
        }
    }
}

impl CredentialProvider for SessionHandle {
    fn bearer_token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    fn invalidate(&self, rejected_token: &str) {
        if self.state.borrow().token() != Some(rejected_token) {
            debug!("Ignoring rejection of a token that is no longer in use");
            return;
        }
        warn!("Session invalidated by the server, redirecting to login");
        self.clear();
        self.navigator.navigate(Route::Login);
    }
}
