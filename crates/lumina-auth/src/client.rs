//! REST client for the account backend.
//!
//! # Endpoints
//!
//! - `POST /api/v1/auth/login` - `{email, password}` -> `{accessToken, refreshToken, user}`
//! - `POST /api/v1/auth/register` - `{userName, email, password}` -> `user`
//! - `POST /api/v1/auth/logout` - `{}` with bearer token
//! - `POST /api/v1/auth/update` - `{name, email}` with bearer token -> `user`

use lumina_core::AuthConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AuthError, Result};
use crate::models::{
    Envelope, LoginData, LoginRequest, RegisterRequest, UpdateProfileRequest, User,
};

/// Typed client for the account endpoints.
///
/// Every failure is reported as an [`AuthError`]; turning failures into user
/// messages is left to [`crate::AuthSession`].
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    /// Creates a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Request` if the HTTP client cannot be built.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuthError::request("client setup", e))?;

        Ok(Self {
            http,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Signs in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("login", "login", &body, None).await
    }

    /// Creates an account. The new user still has to sign in.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let body = RegisterRequest {
            user_name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("register", "register", &body, None).await
    }

    /// Ends the session on the backend. The response body is ignored.
    pub async fn logout(&self, access_token: &str) -> Result<()> {
        self.send("logout", "logout", &serde_json::json!({}), Some(access_token))
            .await?;
        Ok(())
    }

    /// Changes the signed-in user's name and email.
    pub async fn update_profile(&self, access_token: &str, name: &str, email: &str) -> Result<User> {
        let body = UpdateProfileRequest {
            name: name.to_string(),
            email: email.to_string(),
        };
        self.post("update", "update", &body, Some(access_token)).await
    }

    async fn post<B, T>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self.send(operation, path, body, bearer).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AuthError::request(operation, e))?;

        serde_json::from_slice::<Envelope<T>>(&bytes)
            .map(|envelope| envelope.data)
            .map_err(|e| AuthError::decode(operation, e.to_string()))
    }

    async fn send<B>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response>
    where
        B: Serialize + Sync,
    {
        let url = format!("{}/api/v1/auth/{path}", self.base_url);
        debug!(operation, url = %url, "Calling account backend");

        let mut request = self.http.post(&url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::request(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(operation, status = status.as_u16(), "Account backend rejected request");
            return Err(AuthError::Rejected {
                operation,
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}
