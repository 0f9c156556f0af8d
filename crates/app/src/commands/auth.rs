//! Account and session commands

use privacyguard_domain::{LoginRequest, Result as DomainResult, User, UserCreate};
use tracing::info;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_logged;

/// Create an account. The session is not changed.
pub async fn register(ctx: &AppContext, user: UserCreate) -> DomainResult<User> {
    execute_logged("auth::register", || async { Ok(ctx.api.register(&user).await?) }).await
}

/// Log in and return the freshly cached profile.
pub async fn login(ctx: &AppContext, email: String, password: String) -> DomainResult<User> {
    execute_logged("auth::login", || async move {
        ctx.api.login(&LoginRequest { email, password }).await?;
        match ctx.session.cached_profile() {
            Some(profile) => Ok(profile),
            None => Ok(ctx.api.current_user().await?),
        }
    })
    .await
}

/// Log out locally and, best effort, on the server.
pub async fn logout(ctx: &AppContext) -> DomainResult<()> {
    execute_logged("auth::logout", || async {
        if !ctx.session.is_authenticated() {
            info!("No active session");
        }
        Ok(ctx.api.logout().await?)
    })
    .await
}

/// Current profile from the server.
pub async fn whoami(ctx: &AppContext) -> DomainResult<User> {
    execute_logged("auth::whoami", || async { Ok(ctx.api.current_user().await?) }).await
}
