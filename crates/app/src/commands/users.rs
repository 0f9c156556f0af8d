//! Admin user management commands
//!
//! The admin check here only saves a round trip when the cached profile
//! already says the caller is not an admin. The server decides either way.

use privacyguard_domain::{PrivacyGuardError, Result as DomainResult, Role, User};

use crate::context::AppContext;
use crate::utils::command_helpers::execute_logged;

fn require_admin(ctx: &AppContext) -> DomainResult<()> {
    match ctx.session.cached_profile() {
        Some(profile) if !profile.is_admin() => Err(PrivacyGuardError::Auth(format!(
            "user '{}' is not an administrator",
            profile.username
        ))),
        _ => Ok(()),
    }
}

pub async fn list_users(ctx: &AppContext) -> DomainResult<Vec<User>> {
    execute_logged("users::list", || async {
        require_admin(ctx)?;
        Ok(ctx.api.list_users().await?)
    })
    .await
}

pub async fn show_user(ctx: &AppContext, user_id: i64) -> DomainResult<User> {
    execute_logged("users::show", || async {
        require_admin(ctx)?;
        Ok(ctx.api.get_user(user_id).await?)
    })
    .await
}

pub async fn set_role(ctx: &AppContext, user_id: i64, role: Role) -> DomainResult<User> {
    execute_logged("users::set_role", || async move {
        require_admin(ctx)?;
        Ok(ctx.api.change_user_role(user_id, role).await?)
    })
    .await
}

pub async fn delete_user(ctx: &AppContext, user_id: i64) -> DomainResult<()> {
    execute_logged("users::delete", || async {
        require_admin(ctx)?;
        Ok(ctx.api.delete_user(user_id).await?)
    })
    .await
}
