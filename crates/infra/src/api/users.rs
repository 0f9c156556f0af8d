//! User administration endpoints
//!
//! All of these except [`ApiClient::current_user`] require the admin role;
//! the server enforces it and answers 403 otherwise.

use privacyguard_domain::constants::{user_path, user_role_path, USERS_PATH};
use privacyguard_domain::{ChangeRoleRequest, Role, User};
use tracing::{info, instrument};

use super::auth::expect_body;
use super::client::ApiClient;
use super::errors::ApiError;

impl ApiClient {
    /// # Errors
    /// `ApiError::Forbidden` for non-admin callers.
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.get(USERS_PATH).await?.unwrap_or_default())
    }

    /// # Errors
    /// `ApiError::NotFound` for an unknown id.
    pub async fn get_user(&self, user_id: i64) -> Result<User, ApiError> {
        expect_body(self.get(&user_path(user_id)).await?, "user")
    }

    /// # Errors
    /// Status errors from the server (unknown role, unknown user, not admin).
    #[instrument(skip(self, role))]
    pub async fn change_user_role(&self, user_id: i64, role: Role) -> Result<User, ApiError> {
        let body = ChangeRoleRequest { role };
        let updated: User =
            expect_body(self.patch(&user_role_path(user_id), &body).await?, "role change")?;
        info!(user_id, role = %updated.role, "User role changed");
        Ok(updated)
    }

    /// # Errors
    /// Status errors from the server.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: i64) -> Result<(), ApiError> {
        self.delete::<serde_json::Value>(&user_path(user_id)).await?;
        info!(user_id, "User deleted");
        Ok(())
    }
}
