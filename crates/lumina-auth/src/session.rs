//! The signed-in user and the four account operations.
//!
//! [`AuthSession`] wraps [`AuthClient`] for interactive use: every operation
//! holds the busy overlay while the request is in flight, reports the outcome
//! as a [`Notification`] and returns a plain `bool`. The typed error is only
//! logged; the user sees a generic message.

use std::path::PathBuf;

use lumina_core::{track, AuthConfig, BusyRequest, BusyStore, Config, ProgressConfig};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::client::AuthClient;
use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::models::User;
use crate::notify::{Notification, NotificationBroadcaster};

/// Shown for every failed backend call, whatever the cause.
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials";
/// Shown when a login field is blank.
pub const MSG_LOGIN_FIELDS: &str = "Please fill in all fields";
/// Shown when a required registration or profile field is blank.
pub const MSG_REQUIRED_FIELDS: &str = "Please fill in all required fields";
/// Shown after a successful login.
pub const MSG_LOGIN_OK: &str = "Student login successful!";
/// Shown after an account is created.
pub const MSG_REGISTER_OK: &str = "Account created successfully";
/// Shown after signing out.
pub const MSG_LOGOUT_OK: &str = "Logged out successfully";
/// Shown after the profile is saved.
pub const MSG_UPDATE_OK: &str = "Profile information updated";

const BUSY_LOGIN: &str = "Signing in...";
const BUSY_REGISTER: &str = "Creating account...";
const BUSY_LOGOUT: &str = "Signing out...";
const BUSY_UPDATE: &str = "Saving changes...";

/// Client-side account state.
#[derive(Debug)]
pub struct AuthSession {
    client: AuthClient,
    auth: AuthConfig,
    progress: ProgressConfig,
    store: BusyStore,
    notifications: NotificationBroadcaster,
    user: Option<User>,
    credentials: Option<Credentials>,
    credentials_path: Option<PathBuf>,
}

impl AuthSession {
    /// Creates a signed-out session that reports through `store`.
    #[must_use]
    pub fn new(client: AuthClient, store: BusyStore, config: &Config) -> Self {
        Self {
            client,
            auth: config.auth.clone(),
            progress: config.progress.clone(),
            store,
            notifications: NotificationBroadcaster::default(),
            user: None,
            credentials: None,
            credentials_path: None,
        }
    }

    /// Persists credentials to `path` on login and removes them on logout.
    #[must_use]
    pub fn with_persistence(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    /// Loads previously saved credentials.
    ///
    /// Returns `true` if a live access token was found. Expired credentials
    /// are discarded.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CredentialsFile` if the saved file is unreadable.
    pub fn restore(&mut self) -> Result<bool, AuthError> {
        let Some(path) = &self.credentials_path else {
            return Ok(false);
        };

        match Credentials::load(path)? {
            Some(credentials) if credentials.access_token().is_some() => {
                info!(path = %path.display(), "Restored saved credentials");
                self.credentials = Some(credentials);
                Ok(true)
            }
            Some(_) => {
                info!("Saved credentials have expired");
                Credentials::remove(path)?;
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// The signed-in user, if the backend has returned one.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The tokens held by this session.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Returns `true` while an unexpired access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// The channel operation outcomes are published on.
    #[must_use]
    pub const fn notifications(&self) -> &NotificationBroadcaster {
        &self.notifications
    }

    /// Receives the outcome of every later operation.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Signs in. Empty fields are rejected without contacting the backend.
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        if is_blank(&[email, password]) {
            self.notify(Notification::error(MSG_LOGIN_FIELDS));
            return false;
        }

        let request = BusyRequest::pending().with_message(BUSY_LOGIN);
        let result = track(
            &self.store,
            self.progress.clone(),
            request,
            self.client.login(email, password),
        )
        .await;

        match result {
            Ok(data) => {
                let credentials = Credentials::issue(data.access_token, data.refresh_token, &self.auth);
                self.persist(&credentials);
                self.credentials = Some(credentials);
                info!(user = %data.user.email, role = %data.user.account_type, "Signed in");
                self.user = Some(data.user);
                self.notify(Notification::success(MSG_LOGIN_OK));
                true
            }
            Err(e) => self.fail("login", &e),
        }
    }

    /// Creates an account. Does not sign in.
    pub async fn sign_up(&mut self, name: &str, email: &str, password: &str) -> bool {
        if is_blank(&[name, email, password]) {
            self.notify(Notification::error(MSG_REQUIRED_FIELDS));
            return false;
        }

        let request = BusyRequest::pending().with_message(BUSY_REGISTER);
        let result = track(
            &self.store,
            self.progress.clone(),
            request,
            self.client.register(name, email, password),
        )
        .await;

        match result {
            Ok(user) => {
                info!(user = %user.email, "Account created");
                self.user = Some(user);
                self.notify(Notification::success(MSG_REGISTER_OK));
                true
            }
            Err(e) => self.fail("register", &e),
        }
    }

    /// Signs out on the backend, then forgets the user and the tokens.
    ///
    /// Local state is kept when the backend call fails.
    pub async fn logout(&mut self) -> bool {
        let Some(token) = self.access_token().map(str::to_string) else {
            return self.fail("logout", &AuthError::NotAuthenticated);
        };

        let request = BusyRequest::pending().with_message(BUSY_LOGOUT);
        let result = track(
            &self.store,
            self.progress.clone(),
            request,
            self.client.logout(&token),
        )
        .await;

        match result {
            Ok(()) => {
                self.user = None;
                self.credentials = None;
                if let Some(path) = &self.credentials_path {
                    if let Err(e) = Credentials::remove(path) {
                        warn!(error = %e, "Failed to remove saved credentials");
                    }
                }
                info!("Signed out");
                self.notify(Notification::success(MSG_LOGOUT_OK));
                true
            }
            Err(e) => self.fail("logout", &e),
        }
    }

    /// Changes the signed-in user's name and email.
    pub async fn change_information(&mut self, name: &str, email: &str) -> bool {
        if is_blank(&[name, email]) {
            self.notify(Notification::error(MSG_REQUIRED_FIELDS));
            return false;
        }
        let Some(token) = self.access_token().map(str::to_string) else {
            return self.fail("update", &AuthError::NotAuthenticated);
        };

        let request = BusyRequest::pending().with_message(BUSY_UPDATE);
        let result = track(
            &self.store,
            self.progress.clone(),
            request,
            self.client.update_profile(&token, name, email),
        )
        .await;

        match result {
            Ok(user) => {
                info!(user = %user.email, "Profile updated");
                self.user = Some(user);
                self.notify(Notification::success(MSG_UPDATE_OK));
                true
            }
            Err(e) => self.fail("update", &e),
        }
    }

    fn access_token(&self) -> Option<&str> {
        self.credentials.as_ref().and_then(Credentials::access_token)
    }

    fn persist(&self, credentials: &Credentials) {
        if let Some(path) = &self.credentials_path {
            if let Err(e) = credentials.save(path) {
                warn!(error = %e, "Failed to save credentials");
            }
        }
    }

    fn fail(&self, operation: &'static str, error: &AuthError) -> bool {
        warn!(operation, error = %error, transient = error.is_transient(), "Account operation failed");
        self.notify(Notification::error(MSG_INVALID_CREDENTIALS));
        false
    }

    fn notify(&self, notification: Notification) {
        self.notifications.send(notification);
    }
}

fn is_blank(fields: &[&str]) -> bool {
    fields.iter().any(|field| field.trim().is_empty())
}
