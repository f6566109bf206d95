//! Sign-in commands.
//!
//! # Usage
//!
//! ```bash
//! blossom login -u florist -p secret1
//! blossom whoami
//! blossom logout
//! ```

use blossom_storefront::types::LoginRequest;
use tracing::info;

use super::{CommandError, Context, out};

/// Sign in and persist the session.
///
/// # Errors
///
/// Returns an error if the credentials are rejected or the session cannot be stored.
pub async fn login(ctx: &Context, login_id: &str, password: &str) -> Result<(), CommandError> {
    let user = ctx
        .client
        .login(&LoginRequest::new(login_id, password))
        .await?;

    info!(member_id = %user.id, "Signed in");
    out(format_args!("Signed in as {} ({})", user.name, user.role));
    Ok(())
}

/// Forget the stored session.
///
/// # Errors
///
/// Returns an error if the session file cannot be removed.
pub fn logout(ctx: &Context) -> Result<(), CommandError> {
    ctx.client.logout()?;
    out("Signed out");
    Ok(())
}

/// Show who is signed in.
pub fn whoami(ctx: &Context) {
    match ctx.client.session().user() {
        Some(user) => {
            out(format_args!("{} ({})", user.name, user.login_id));
            out(format_args!("  member: {}", user.id));
            out(format_args!("  role:   {}", user.role));
            if let Some(email) = &user.email {
                out(format_args!("  email:  {email}"));
            }
        }
        None => out("Not signed in"),
    }
}
