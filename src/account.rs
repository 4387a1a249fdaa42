//! Login, registration and the current user's profile.

use tracing::info;

use crate::classify::Action;
use crate::client::Api;
use crate::error::Result;
use crate::inflight::InFlightTarget;
use crate::protocol::{paths, LoginRequest, Method, RegisterRequest, TokenResponse, UserProfile};
use crate::transport::ApiRequest;

/// Account operations. Obtain one with [`LobbyClient::account`](crate::LobbyClient::account).
#[derive(Clone)]
pub struct AccountClient {
    api: Api,
}

impl AccountClient {
    pub(crate) fn new(api: Api) -> Self {
        Self { api }
    }

    /// Exchange username and password for a credential and store it.
    ///
    /// # Errors
    ///
    /// - [`LobbyError::Authentication`](crate::LobbyError::Authentication) for a wrong username or password
    /// - [`LobbyError::Storage`](crate::LobbyError::Storage) if the credential could not be persisted
    /// - [`LobbyError::Transport`](crate::LobbyError::Transport) for anything else
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let body = serde_json::to_value(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let request = ApiRequest::new(Method::Post, paths::LOGIN).with_body(body);
        let TokenResponse { token } = self.api.send_json(Action::Login, InFlightTarget::Unscoped, request).await?;

        self.api.session().set_credential(Some(&token))?;
        info!(subject = ?self.api.session().identity(), "logged in");
        Ok(())
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// - [`LobbyError::Conflict`](crate::LobbyError::Conflict) if the username is taken
    /// - [`LobbyError::Validation`](crate::LobbyError::Validation) if the server rejects the details
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<UserProfile> {
        let target = InFlightTarget::Name(username.to_string());
        let body = serde_json::to_value(RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let request = ApiRequest::new(Method::Post, paths::REGISTER).with_body(body);
        let profile: UserProfile = self.api.send_json(Action::Register, target, request).await?;
        info!(user = profile.id, "registered");
        Ok(profile)
    }

    /// Fetch the profile of the logged-in user from the server.
    ///
    /// Unlike [`SessionStore::identity`](crate::SessionStore::identity) this is
    /// the server's verified view of who the credential belongs to.
    ///
    /// # Errors
    ///
    /// Fails fast with [`LobbyError::Authentication`](crate::LobbyError::Authentication) when logged out.
    pub async fn current_user(&self) -> Result<UserProfile> {
        self.api.require_credential(Action::FetchIdentity)?;
        self.api
            .send_json(
                Action::FetchIdentity,
                InFlightTarget::Unscoped,
                ApiRequest::new(Method::Get, paths::CURRENT_USER),
            )
            .await
    }

    /// Forget the stored credential.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::Storage`](crate::LobbyError::Storage) if the durable slot could not be removed.
    pub fn logout(&self) -> Result<()> {
        self.api.session().logout()?;
        info!("logged out");
        Ok(())
    }
}

impl std::fmt::Debug for AccountClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountClient").finish_non_exhaustive()
    }
}
