//! Session State Machine
//!
//! Owns the login form state and orchestrates manual login and auto-login
//! against the injected [`AuthGateway`], [`CredentialStore`] and
//! [`NetworkMonitor`].
//!
//! # States
//!
//! ```text
//!            login / check_auto_login
//!   Idle ───────────────────────────▶ Submitting
//!    ▲                                   │
//!    │ dismiss_*                         ├──▶ Success
//!    │                                   ├──▶ InvalidCredentials
//!    └── EmptyFields / NetworkError ◀────┘  (popups, until dismissed)
//! ```
//!
//! At most one login attempt is in flight per machine. The in-flight claim is
//! taken synchronously right before Submitting is entered, so an overlapping
//! attempt is a no-op that never reaches the gateway. Auto-login reads the
//! credential store without holding the claim. `is_loading` is reset by a
//! guard, so it is cleared on every exit path, including cancellation.
//!
//! `authenticated` only describes the latest attempt: starting a new attempt
//! or showing any popup clears it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::SessionConfig;
use crate::credentials::{CredentialStore, Credentials, NetworkMonitor};
use crate::errors::SyncError;
use crate::gateway::{AuthGateway, LoginRequest};
use crate::scope::Disposable;
use crate::state::StateCell;

/// Which modal message, if any, the login screen shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Popup {
    /// No popup
    #[default]
    None,
    /// Phone number or password was empty
    EmptyFields,
    /// The server rejected the login, or the login call failed
    InvalidCredentials,
    /// The network was unavailable
    NetworkError,
}

/// Published login screen state
///
/// Invariant: `is_loading` implies `active_popup == Popup::None`.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Digits-only phone number field
    pub phone_number: String,
    /// Password field
    #[serde(skip)]
    pub password: String,
    /// Auto-login checkbox
    pub auto_login_enabled: bool,
    /// Whether a login call is in flight
    pub is_loading: bool,
    /// The popup currently shown
    pub active_popup: Popup,
    /// Whether a login has succeeded on this screen
    pub authenticated: bool,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("phone_number", &self.phone_number)
            .field("password", &"<redacted>")
            .field("auto_login_enabled", &self.auto_login_enabled)
            .field("is_loading", &self.is_loading)
            .field("active_popup", &self.active_popup)
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

/// State-machine phase derived from [`SessionState`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for input
    Idle,
    /// A login call is in flight
    Submitting,
    /// A login succeeded
    Success,
    /// Empty fields popup is showing
    EmptyFieldsError,
    /// Invalid credentials popup is showing
    InvalidCredentialsError,
    /// Network error popup is showing
    NetworkError,
}

impl SessionState {
    /// Current phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.is_loading {
            return SessionPhase::Submitting;
        }
        match self.active_popup {
            Popup::EmptyFields => SessionPhase::EmptyFieldsError,
            Popup::InvalidCredentials => SessionPhase::InvalidCredentialsError,
            Popup::NetworkError => SessionPhase::NetworkError,
            Popup::None if self.authenticated => SessionPhase::Success,
            Popup::None => SessionPhase::Idle,
        }
    }
}

/// Result of a login or auto-login attempt, for callers that await it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Login succeeded and the success callback ran
    Succeeded,
    /// The gateway rejected the login or failed
    Rejected(SyncError),
    /// A field was empty; the gateway was not contacted
    EmptyFields,
    /// The network was unavailable; the gateway was not contacted
    NetworkUnavailable,
    /// Another attempt was already in flight; nothing happened
    AlreadySubmitting,
    /// Auto-login is disabled or nothing is saved
    AutoLoginSkipped,
}

/// Callback invoked with `true` after each successful login
pub type LoginCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// The login screen state machine
pub struct SessionMachine<A, C, N>
where
    A: AuthGateway,
    C: CredentialStore,
    N: NetworkMonitor,
{
    gateway: Arc<A>,
    credentials: Arc<C>,
    network: Arc<N>,
    state: StateCell<SessionState>,
    submitting: AtomicBool,
    on_login_success: Mutex<Option<LoginCallback>>,
}

/// Claim on the single in-flight slot
///
/// Dropping the claim clears `is_loading` (if this attempt set it) and frees
/// the slot.
struct InFlight<'a> {
    slot: &'a AtomicBool,
    state: &'a StateCell<SessionState>,
    loading: bool,
}

impl<'a> InFlight<'a> {
    fn claim(slot: &'a AtomicBool, state: &'a StateCell<SessionState>) -> Option<Self> {
        slot.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                slot,
                state,
                loading: false,
            })
    }

    /// Enter Submitting, applying `f` in the same update
    fn start_loading(&mut self, f: impl FnOnce(&mut SessionState)) {
        self.loading = true;
        self.state.update(|s| {
            f(s);
            s.is_loading = true;
            s.active_popup = Popup::None;
            s.authenticated = false;
        });
    }

    /// Leave Submitting, applying `f` in the same update
    fn settle(&mut self, f: impl FnOnce(&mut SessionState)) {
        self.loading = false;
        self.state.update(|s| {
            s.is_loading = false;
            f(s);
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.loading {
            self.state.update(|s| s.is_loading = false);
        }
        self.slot.store(false, Ordering::Release);
    }
}

impl<A, C, N> SessionMachine<A, C, N>
where
    A: AuthGateway,
    C: CredentialStore,
    N: NetworkMonitor,
{
    /// Create a machine with default field values
    pub fn new(
        gateway: Arc<A>,
        credentials: Arc<C>,
        network: Arc<N>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            gateway,
            credentials,
            network,
            state: StateCell::new(SessionState {
                auto_login_enabled: config.auto_login_default,
                ..SessionState::default()
            }),
            submitting: AtomicBool::new(false),
            on_login_success: Mutex::new(None),
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state.snapshot()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Register the callback run after each successful login
    pub fn set_on_login_success(&self, callback: impl Fn(bool) + Send + Sync + 'static) {
        *self.on_login_success.lock() = Some(Arc::new(callback));
    }

    // ============================================
    // Field intents
    // ============================================

    /// Replace the phone number, keeping only ASCII digits
    pub fn update_phone_number(&self, input: &str) {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        self.state.update(|s| s.phone_number = digits);
    }

    /// Replace the password verbatim
    pub fn update_password(&self, input: &str) {
        self.state.update(|s| s.password = input.to_string());
    }

    /// Replace the auto-login flag
    pub fn update_auto_login(&self, enabled: bool) {
        self.state.update(|s| s.auto_login_enabled = enabled);
    }

    /// Hide the empty fields popup
    pub fn dismiss_empty_fields_popup(&self) {
        self.dismiss(Popup::EmptyFields);
    }

    /// Hide the invalid credentials popup
    pub fn dismiss_invalid_credentials_popup(&self) {
        self.dismiss(Popup::InvalidCredentials);
    }

    /// Hide the network error popup
    pub fn dismiss_network_error_popup(&self) {
        self.dismiss(Popup::NetworkError);
    }

    fn dismiss(&self, popup: Popup) {
        self.state.update_if(|s| {
            if s.active_popup != popup {
                return false;
            }
            s.active_popup = Popup::None;
            true
        });
    }

    fn show(&self, popup: Popup) {
        self.state.update(|s| {
            s.active_popup = popup;
            s.authenticated = false;
        });
    }

    /// Surface a failure caught before the gateway was contacted
    fn refuse(&self, cause: SyncError) -> LoginOutcome {
        tracing::info!(reason = %cause, "Login not attempted");
        match cause {
            SyncError::Validation => {
                self.show(Popup::EmptyFields);
                LoginOutcome::EmptyFields
            }
            SyncError::NetworkUnavailable => {
                self.show(Popup::NetworkError);
                LoginOutcome::NetworkUnavailable
            }
            other => {
                self.show(Popup::InvalidCredentials);
                LoginOutcome::Rejected(other)
            }
        }
    }

    // ============================================
    // Login flows
    // ============================================

    /// Attempt a login with saved credentials, if auto-login is enabled
    ///
    /// The store is read without claiming the in-flight slot, so a manual
    /// login started meanwhile goes ahead and this attempt then yields.
    pub async fn check_auto_login(&self) -> LoginOutcome {
        if self.submitting.load(Ordering::Acquire) {
            tracing::debug!("Auto-login skipped, a login is already in flight");
            return LoginOutcome::AlreadySubmitting;
        }

        if !self.network.is_network_available() {
            return self.refuse(SyncError::NetworkUnavailable);
        }

        let enabled = match self.credentials.is_auto_login_enabled().await {
            Ok(enabled) => enabled,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read auto-login flag");
                false
            }
        };
        // A manual login saves the checkbox it started with; leave it alone
        if self.submitting.load(Ordering::Acquire) {
            tracing::debug!("Auto-login yielded to a login already in flight");
            return LoginOutcome::AlreadySubmitting;
        }
        self.state.update(|s| s.auto_login_enabled = enabled);
        if !enabled {
            return LoginOutcome::AutoLoginSkipped;
        }

        let saved = match self.credentials.saved_credentials().await {
            Ok(Some(saved)) => saved,
            Ok(None) => return LoginOutcome::AutoLoginSkipped,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read saved credentials");
                return LoginOutcome::AutoLoginSkipped;
            }
        };

        let Some(mut flight) = InFlight::claim(&self.submitting, &self.state) else {
            tracing::debug!("Auto-login yielded to a login already in flight");
            return LoginOutcome::AlreadySubmitting;
        };
        flight.start_loading(|s| {
            s.phone_number.clone_from(&saved.phone_number);
            s.password.clone_from(&saved.password);
        });

        match self.authenticate(&saved).await {
            Ok(()) => {
                flight.settle(|s| s.authenticated = true);
                drop(flight);
                tracing::info!(phone = %saved.phone_number, "Auto-login succeeded");
                self.notify_success();
                LoginOutcome::Succeeded
            }
            Err(cause) => {
                flight.settle(|s| s.active_popup = Popup::InvalidCredentials);
                LoginOutcome::Rejected(cause)
            }
        }
    }

    /// Attempt a login with the given fields
    ///
    /// A no-op while another attempt is in flight.
    pub async fn login(&self, phone_number: &str, password: &str) -> LoginOutcome {
        let Some(mut flight) = InFlight::claim(&self.submitting, &self.state) else {
            tracing::debug!("Login ignored, an attempt is already in flight");
            return LoginOutcome::AlreadySubmitting;
        };

        if phone_number.is_empty() || password.is_empty() {
            return self.refuse(SyncError::Validation);
        }

        if !self.network.is_network_available() {
            return self.refuse(SyncError::NetworkUnavailable);
        }

        flight.start_loading(|_| {});
        let credentials = Credentials::new(phone_number, password);

        match self.authenticate(&credentials).await {
            Ok(()) => {
                let auto_login = self.state.read(|s| s.auto_login_enabled);
                if let Err(e) = self
                    .credentials
                    .save_login_info(&credentials, auto_login)
                    .await
                {
                    tracing::warn!(error = %e, "Login succeeded but credentials were not saved");
                }
                flight.settle(|s| s.authenticated = true);
                drop(flight);
                tracing::info!(phone = %phone_number, auto_login, "Login succeeded");
                self.notify_success();
                LoginOutcome::Succeeded
            }
            Err(cause) => {
                flight.settle(|s| s.active_popup = Popup::InvalidCredentials);
                LoginOutcome::Rejected(cause)
            }
        }
    }

    /// One gateway round trip; every failure becomes `AuthRejected`-class
    async fn authenticate(&self, credentials: &Credentials) -> Result<(), SyncError> {
        let request = LoginRequest::new(&credentials.phone_number, &credentials.password);
        match self.gateway.login(&request).await {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => {
                tracing::info!(
                    status = %response.status,
                    message = %response.message,
                    "Login rejected"
                );
                Err(SyncError::AuthRejected)
            }
            Err(e) => {
                let cause = SyncError::from(e);
                tracing::warn!(error = %cause, "Login call failed");
                Err(cause)
            }
        }
    }

    fn notify_success(&self) {
        let callback = self.on_login_success.lock().clone();
        if let Some(callback) = callback {
            callback(true);
        }
    }
}

impl<A, C, N> Disposable for SessionMachine<A, C, N>
where
    A: AuthGateway,
    C: CredentialStore,
    N: NetworkMonitor,
{
    fn dispose(&self) {
        self.state.dispose();
    }
}
