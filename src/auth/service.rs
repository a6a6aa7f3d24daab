use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::session::{AuthState, Session};
use crate::client::ApiClient;
use crate::errors::ServiceError;
use crate::models::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, ProfileUpdate,
    ResetPasswordRequest, User,
};
use crate::services::validation::FieldErrors;

/// Minimum password length accepted by the backend.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Drives the session state machine against the backend.
#[derive(Clone, Debug)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// `Anonymous -> Authenticating -> Authenticated | Failed`.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<User, ServiceError> {
        let session = self.client.session();
        session.begin_login().await;

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            remember_me,
        };

        match self.client.auth().login(&request).await {
            Ok(token) => {
                let user = token.user.clone();
                let established = Session {
                    user: token.user,
                    token: token.access_token,
                    token_type: token.token_type,
                };
                if let Err(err) = session.establish(established).await {
                    warn!(error = %err, "logged in but failed to persist session");
                }
                info!(user_id = user.id, role = %user.role, "login succeeded");
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                session.fail(err.user_message()).await;
                Err(err)
            }
        }
    }

    /// Always ends `Anonymous`; a failing logout call is only logged.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let session = self.client.session();
        if session.token().await.is_some() {
            if let Err(err) = self.client.auth().logout().await {
                warn!(error = %err, "logout request failed; clearing local session anyway");
            }
        }
        session.expire().await;
        info!("logged out");
    }

    /// Loads persisted credentials and optimistically enters `Authenticated`.
    /// Pair with [`revalidate`](Self::revalidate) to confirm with the backend.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<bool, ServiceError> {
        let session = self.client.session();
        if session.is_authenticated().await {
            return Ok(true);
        }
        match session.store().load().await {
            Ok(Some(stored)) => {
                info!(user_id = stored.user.id, "restored persisted session");
                session.resume(stored).await;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => {
                warn!(error = %err, "discarding unreadable persisted session");
                session.expire().await;
                Ok(false)
            }
        }
    }

    /// Confirms the held token with `GET /auth/me`; any failure tears the
    /// session down.
    #[instrument(skip(self))]
    pub async fn revalidate(&self) -> Result<User, ServiceError> {
        let session = self.client.session();
        let checked = session.token().await;
        match self.refresh_user().await {
            Ok(user) => Ok(user),
            Err(err) => {
                warn!(error = %err, "session revalidation failed");
                match checked {
                    Some(token) => {
                        session.expire_if_current(&token).await;
                    }
                    None => session.expire().await,
                }
                Err(err)
            }
        }
    }

    /// Start-up path: restore the saved session and confirm it with the
    /// backend. `Ok(None)` when nothing was saved; an error means the saved
    /// session was rejected and has been cleared.
    #[instrument(skip(self))]
    pub async fn resume_saved_session(&self) -> Result<Option<User>, ServiceError> {
        if !self.restore().await? {
            return Ok(None);
        }
        self.revalidate().await.map(Some)
    }

    pub fn spawn_revalidation(&self) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let _ = service.revalidate().await;
        })
    }

    /// Refetches the current user and replaces the cached copy.
    #[instrument(skip(self))]
    pub async fn refresh_user(&self) -> Result<User, ServiceError> {
        let user = self.client.auth().me().await?;
        self.client.session().replace_user(user.clone()).await?;
        Ok(user)
    }

    /// Swaps the held token for a fresh one.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<(), ServiceError> {
        let token = self.client.auth().refresh().await?;
        self.client
            .session()
            .establish(Session {
                user: token.user,
                token: token.access_token,
                token_type: token.token_type,
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User, ServiceError> {
        update.validate()?;

        let user = self.client.auth().update_profile(&update).await?;
        self.client.session().replace_user(user.clone()).await?;
        Ok(user)
    }

    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        check_new_password(new_password)?;
        self.client
            .auth()
            .change_password(&ChangePasswordRequest {
                current_password: current_password.to_string(),
                new_password: new_password.to_string(),
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), ServiceError> {
        self.client
            .auth()
            .forgot_password(&ForgotPasswordRequest {
                email: email.trim().to_string(),
            })
            .await
    }

    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ServiceError> {
        check_new_password(new_password)?;
        self.client
            .auth()
            .reset_password(&ResetPasswordRequest {
                token: token.to_string(),
                new_password: new_password.to_string(),
            })
            .await
    }

    pub async fn state(&self) -> AuthState {
        self.client.session().state().await
    }
}

fn check_new_password(new_password: &str) -> Result<(), ServiceError> {
    let mut errors = FieldErrors::new();
    if new_password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.insert(
            "new_password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_passwords_are_rejected_locally() {
        let err = check_new_password("short").unwrap_err();
        match err {
            ServiceError::Validation(errors) => assert!(errors.contains("new_password")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(check_new_password("long enough").is_ok());
    }
}
