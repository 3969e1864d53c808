//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{AuthResponse, Principal, RegistrationForm, Role, SignInRequest},
    store::SessionStore,
};
use crate::api::{ApiClient, models::UpdateUserRequest};

/// Login, registration and logout against the remote service.
///
/// This is the only type that writes the session store.
#[derive(Clone, Debug)]
pub struct AuthManager {
    client: ApiClient,
    store: SessionStore,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `client` - API client used for the auth endpoints
    /// * `store` - Session store that receives token and principal
    #[must_use]
    pub fn new(client: ApiClient, store: SessionStore) -> Self {
        Self { client, store }
    }

    /// Sign in with email and password.
    ///
    /// On success the token and principal are stored together and the
    /// principal is returned. On failure the existing session is left as is.
    ///
    /// # Errors
    ///
    /// * `AuthError::AuthenticationFailed` - The service rejected the credentials
    /// * `AuthError::Api` - Transport failure or unreadable response
    /// * `AuthError::Storage` - The session could not be persisted
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<Principal> {
        let request = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self.client.sign_in(&request).await.map_err(|e| {
            tracing::warn!(email, error = %e, "Login failed");
            AuthError::from(e)
        })?;

        self.establish(response)
    }

    /// Register a new account and log it in.
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - The form failed local checks; nothing was sent
    /// * `AuthError::AuthenticationFailed` - The service rejected the sign-up
    /// * `AuthError::Api` - Transport failure or unreadable response
    /// * `AuthError::Storage` - The session could not be persisted
    pub async fn register(&self, form: &RegistrationForm) -> AuthResult<Principal> {
        let request = form.validate().map_err(AuthError::Validation)?;

        let response = self.client.sign_up(&request).await.map_err(|e| {
            tracing::warn!(email = %request.email, error = %e, "Registration failed");
            AuthError::from(e)
        })?;

        self.establish(response)
    }

    /// Clear the local session. Never contacts the service and never fails.
    pub fn logout(&self) {
        match self.store.clear() {
            Ok(()) => tracing::info!("Logged out"),
            Err(e) => tracing::error!(error = %e, "Failed to clear session storage"),
        }
    }

    /// Update the logged-in user's profile and replace the stored principal
    /// with the service's response.
    ///
    /// # Errors
    ///
    /// * `AuthError::NotAuthenticated` - No session
    /// * `AuthError::AuthenticationFailed` - The service rejected the update
    pub async fn update_profile(&self, request: &UpdateUserRequest) -> AuthResult<Principal> {
        if !self.store.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }

        let updated = self.client.update_user(request).await?;
        self.store.update_user(&updated)?;
        Ok(updated)
    }

    #[must_use]
    pub fn current_user(&self) -> Option<Principal> {
        self.store.user()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.store.is_authenticated()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.store.user().map(|p| p.role)
    }

    fn establish(&self, response: AuthResponse) -> AuthResult<Principal> {
        self.store
            .save_session(&response.access_token, &response.user)?;
        tracing::info!(
            user_id = response.user.id,
            role = %response.user.role,
            "Session established"
        );
        Ok(response.user)
    }
}
