use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kheyma_api::{
    ApiClient, ApiConfig, ApiError, LoginRequest, ProfileUpdate, RegisterRequest,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use validator::{Validate, ValidationErrors};

use crate::identity::{Identity, Role, identity_from_auth, normalize};
use crate::navigation::Navigator;
use crate::state::{Credentials, SessionHandle, SessionState};
use crate::store::KeyValueStore;

/// Failure of a session operation, carrying the message to show the user
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// The backend did not answer
    #[error("Cannot connect to server. Please check that the booking service is reachable")]
    Unreachable,

    /// Missing or invalid input, reported locally or by the backend
    #[error("{0}")]
    Invalid(String),

    /// Registration with an email that already has an account
    #[error("Email already exists")]
    DuplicateEmail,

    /// Any other rejection
    #[error("{0}")]
    Rejected(String),
}

/// Owns the session lifecycle: bootstrap, login, registration, refresh,
/// profile updates and logout
pub struct SessionManager {
    api: Arc<ApiClient>,
    session: Arc<SessionHandle>,
    bootstrapped: AtomicBool,
}

impl SessionManager {
    /// Create a manager over an existing gateway and session handle
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionHandle>) -> Self {
        Self {
            api,
            session,
            bootstrapped: AtomicBool::new(false),
        }
    }

    /// Wire a session handle, a gateway that reads credentials from it and a
    /// manager over both
    pub fn connect(
        config: ApiConfig,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let session = Arc::new(SessionHandle::new(store, navigator));
        let api = Arc::new(ApiClient::new(config, session.clone())?);
        Ok(Self::new(api, session))
    }

    /// Gateway used by this manager
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Shared session handle
    pub fn session(&self) -> &Arc<SessionHandle> {
        &self.session
    }

    /// Copy of the current session state
    pub fn state(&self) -> SessionState {
        self.session.snapshot()
    }

    /// Observe session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    /// Wait until bootstrap has settled
    pub async fn wait_ready(&self) -> SessionState {
        self.session.wait_ready().await
    }

    /// Restore the persisted session and validate it against `GET /auth/me`
    ///
    /// Runs once per process; later calls return the current state.
    pub async fn bootstrap(&self) -> SessionState {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            debug!("Session bootstrap already ran");
            return self.session.snapshot();
        }

        let Some(cached) = self.session.load_persisted() else {
            debug!("No persisted session");
            self.session.settle_anonymous();
            return self.session.snapshot();
        };

        let token = cached.token.clone();
        if !self.session.begin_validation(cached) {
            debug!("Session already settled before bootstrap, skipping validation");
            return self.session.snapshot();
        }

        info!("Validating persisted session");
        match self.api.me().await {
            Ok(user) => {
                if !self.session.replace_identity(&token, normalize(&user)) {
                    debug!("Session changed during validation, keeping the newer one");
                }
            }
            Err(e) => {
                warn!("Persisted session is no longer valid: {}", e);
                self.session.abandon(&token);
            }
        }

        self.session.snapshot()
    }

    /// Sign in with email and password, returning the resolved role
    pub async fn login(&self, email: &str, password: &str) -> Result<Role, AuthFailure> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request
            .validate()
            .map_err(|e| AuthFailure::Invalid(validation_message(&e)))?;

        match self.api.login(&request).await {
            Ok(response) => {
                let identity = identity_from_auth(&response);
                let role = identity.role;
                self.session.establish(Credentials {
                    token: response.token,
                    identity,
                });
                Ok(role)
            }
            Err(e) => {
                warn!("Login failed for {}: {}", request.email, e);
                Err(match e {
                    ApiError::NetworkUnreachable(_) => AuthFailure::Unreachable,
                    other => AuthFailure::Rejected(other.user_message("Login failed")),
                })
            }
        }
    }

    /// Create an account and sign in
    ///
    /// Without a display name the local part of the email is used.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Role, AuthFailure> {
        let email = email.trim();
        let supplied_name = name.map(str::trim).filter(|n| !n.is_empty());
        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: supplied_name
                .map(str::to_string)
                .unwrap_or_else(|| default_display_name(email)),
        };
        request
            .validate()
            .map_err(|e| AuthFailure::Invalid(validation_message(&e)))?;

        match self.api.register(&request).await {
            Ok(response) => {
                let mut identity = identity_from_auth(&response);
                if let Some(name) = supplied_name {
                    identity.name = Some(name.to_string());
                }
                let role = identity.role;
                self.session.establish(Credentials {
                    token: response.token,
                    identity,
                });
                Ok(role)
            }
            Err(e) => {
                warn!("Registration failed for {}: {}", email, e);
                Err(classify_registration_failure(&e))
            }
        }
    }

    /// Exchange the current token for a fresh one
    pub async fn refresh(&self) -> Result<Role, AuthFailure> {
        let Some(token) = self.session.snapshot().token().map(str::to_string) else {
            return Err(AuthFailure::Rejected("Not signed in".to_string()));
        };

        match self.api.refresh().await {
            Ok(response) => {
                if self.session.snapshot().token() != Some(token.as_str()) {
                    debug!("Session changed during refresh, discarding refreshed token");
                    return Ok(self.session.snapshot().role());
                }
                let identity = identity_from_auth(&response);
                let role = identity.role;
                self.session.establish(Credentials {
                    token: response.token,
                    identity,
                });
                Ok(role)
            }
            Err(e) => Err(failure_from(e, "Session refresh failed")),
        }
    }

    /// Update the current user's profile
    ///
    /// The stored identity changes only once the backend has answered.
    pub async fn update_identity(&self, update: &ProfileUpdate) -> Result<Identity, AuthFailure> {
        let Some(token) = self.session.snapshot().token().map(str::to_string) else {
            return Err(AuthFailure::Rejected("Not signed in".to_string()));
        };

        match self.api.update_me(update).await {
            Ok(user) => {
                let identity = normalize(&user);
                if !self.session.replace_identity(&token, identity.clone()) {
                    debug!("Session changed during profile update, not applying it");
                }
                Ok(identity)
            }
            Err(e) => {
                warn!("Profile update failed: {}", e);
                Err(failure_from(e, "Update failed"))
            }
        }
    }

    /// Sign out; idempotent and never suspends
    pub fn logout(&self) {
        if self.session.snapshot().token().is_some() {
            info!("Logging out");
        }
        self.session.clear();
    }
}

/// Local part of an email address
fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

fn failure_from(error: ApiError, fallback: &str) -> AuthFailure {
    match error {
        ApiError::NetworkUnreachable(_) => AuthFailure::Unreachable,
        other => AuthFailure::Rejected(other.user_message(fallback)),
    }
}

fn classify_registration_failure(error: &ApiError) -> AuthFailure {
    match error {
        ApiError::NetworkUnreachable(_) => AuthFailure::Unreachable,
        ApiError::ValidationFailed(payload) => {
            let messages = payload.field_messages();
            if !messages.is_empty() {
                AuthFailure::Invalid(messages.join(", "))
            } else {
                AuthFailure::Invalid(
                    payload
                        .message()
                        .unwrap_or("Invalid registration data")
                        .to_string(),
                )
            }
        }
        ApiError::Conflict(_) => AuthFailure::DuplicateEmail,
        other => AuthFailure::Rejected(other.user_message("Registration failed")),
    }
}

/// Join the messages of failed required-field checks
pub(crate) fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}
