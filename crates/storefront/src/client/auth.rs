//! Member login and registration.

use tracing::instrument;

use super::{ApiClient, Call};
use crate::error::ApiError;
use crate::types::{LoginRequest, RegisterRequest, User};
use crate::validate::Validate;

impl ApiClient {
    /// Sign in and store the member in the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are blank, the backend rejects
    /// them, or the session cannot be persisted.
    #[instrument(skip(self, request), fields(login_id = %request.login_id))]
    pub async fn login(&self, request: &LoginRequest) -> Result<User, ApiError> {
        request.validate()?;
        let user: User = self
            .fetch(Call::post("/members/login").json(request)?)
            .await?;
        self.session().sign_in(user.clone())?;
        Ok(user)
    }

    /// Create an account and sign in as it.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration is invalid, rejected, or the
    /// session cannot be persisted.
    #[instrument(skip(self, request), fields(login_id = %request.login_id))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        request.validate()?;
        let user: User = self
            .fetch(Call::post("/members/register").json(request)?)
            .await?;
        self.session().sign_in(user.clone())?;
        Ok(user)
    }

    /// Forget the signed-in member.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted session cannot be removed.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session().sign_out()?;
        Ok(())
    }
}
