//! Authentication endpoints
//!
//! Register, login and refresh are sent without a stored credential so a 401
//! from them can never start another refresh cycle.

use async_trait::async_trait;
use privacyguard_common::auth::{CredentialPair, RefreshError, TokenRefresher};
use privacyguard_domain::constants::{
    AUTH_LOGIN_PATH, AUTH_LOGOUT_PATH, AUTH_REFRESH_PATH, AUTH_REGISTER_PATH, USERS_ME_PATH,
};
use privacyguard_domain::{LoginRequest, RefreshRequest, TokenResponse, User, UserCreate};
use tracing::{info, instrument, warn};

use super::client::{ApiClient, ApiRequest};
use super::errors::ApiError;

pub(crate) fn expect_body<T>(value: Option<T>, what: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::Decode(format!("empty response body for {what}")))
}

impl ApiClient {
    /// Create an account. Does not log in.
    ///
    /// # Errors
    /// Returns the server's rejection (e.g. duplicate email) as a status error.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn register(&self, user: &UserCreate) -> Result<User, ApiError> {
        let request = ApiRequest::post(AUTH_REGISTER_PATH).json(user)?.skip_auth();
        let created: User = expect_body(self.execute(&request).await?, "register")?;
        info!(user_id = created.id, "Account registered");
        Ok(created)
    }

    /// Exchange email and password for a credential pair, then fetch and
    /// cache the profile.
    ///
    /// # Errors
    /// Returns the server's rejection, `ApiError::Storage` if the pair cannot
    /// be persisted, or the profile fetch error (the session stays
    /// established in that case).
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<TokenResponse, ApiError> {
        let request = ApiRequest::post(AUTH_LOGIN_PATH).json(credentials)?.skip_auth();
        let tokens: TokenResponse = expect_body(self.execute(&request).await?, "login")?;

        self.session().establish(CredentialPair::from(tokens.clone()))?;
        let profile = self.current_user().await?;
        info!(user_id = profile.id, role = %profile.role, "Logged in");

        Ok(tokens)
    }

    /// Rotate the credential pair now, sharing any refresh already in flight.
    ///
    /// Unlike a refresh triggered by a 401, a failure here does not log the
    /// session out.
    ///
    /// # Errors
    /// `ApiError::Unauthorized` when no refresh credential is held or the
    /// server rejects it.
    pub async fn refresh_credentials(&self) -> Result<String, ApiError> {
        Ok(self.coordinator().refresh(self, None).await?)
    }

    /// Revoke the refresh credential server-side (best effort) and clear the
    /// local session.
    ///
    /// # Errors
    /// Never fails today; the server call's outcome is only logged.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Some(refresh_token) = self.session().tokens().refresh_credential() {
            let revoke = ApiRequest::post(AUTH_LOGOUT_PATH)
                .json(&RefreshRequest { refresh_token })
                .map(ApiRequest::without_refresh);

            let outcome = match revoke {
                Ok(request) => self.execute::<serde_json::Value>(&request).await.map(drop),
                Err(err) => Err(err),
            };
            if let Err(err) = outcome {
                warn!(error = %err, "Server-side logout failed; clearing local session anyway");
            }
        }

        self.session().logout();
        Ok(())
    }

    /// Fetch the current profile and refresh the cached copy.
    ///
    /// # Errors
    /// Any dispatcher error, including `ApiError::SessionExpired`.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let user: User = expect_body(self.get(USERS_ME_PATH).await?, "current user")?;
        self.session().tokens().set_cached_profile(&user);
        Ok(user)
    }
}

#[async_trait]
impl TokenRefresher for ApiClient {
    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, RefreshError> {
        let request = ApiRequest::post(AUTH_REFRESH_PATH)
            .json(&RefreshRequest { refresh_token: refresh_token.to_string() })
            .map_err(|e| RefreshError::Rejected(e.to_string()))?
            .skip_auth();

        match self.execute::<TokenResponse>(&request).await {
            Ok(Some(tokens)) => Ok(tokens.into()),
            Ok(None) => Err(RefreshError::Rejected("empty refresh response".into())),
            Err(err @ (ApiError::Network(_) | ApiError::Timeout(_))) => {
                Err(RefreshError::Transport(err.to_string()))
            }
            Err(err) => Err(RefreshError::Rejected(err.to_string())),
        }
    }
}
