use reqwest::Method;
use tracing::instrument;

use super::{Access, ApiClient, NO_QUERY};
use crate::errors::ServiceError;
use crate::models::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, ProfileUpdate,
    ResetPasswordRequest, TokenResponse, User,
};

/// `/auth` endpoints. These only talk to the backend; session bookkeeping
/// lives in [`crate::auth::AuthService`].
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: &LoginRequest) -> Result<TokenResponse, ServiceError> {
        self.client
            .send_json(Method::POST, "auth/login", request, Access::Public)
            .await
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ServiceError> {
        self.client
            .send_unit::<()>(Method::POST, "auth/logout", None, Access::Bearer)
            .await
    }

    /// Issues a fresh token for the current session.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<TokenResponse, ServiceError> {
        self.client
            .send_json(Method::POST, "auth/refresh", &serde_json::json!({}), Access::Bearer)
            .await
    }

    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ServiceError> {
        self.client.get_json("auth/me", NO_QUERY).await
    }

    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ServiceError> {
        self.client
            .send_json(Method::PUT, "auth/profile", update, Access::Bearer)
            .await
    }

    #[instrument(skip(self, request))]
    pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<(), ServiceError> {
        self.client
            .send_unit(Method::PUT, "auth/password", Some(request), Access::Bearer)
            .await
    }

    #[instrument(skip(self))]
    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<(), ServiceError> {
        self.client
            .send_unit(Method::POST, "auth/forgot-password", Some(request), Access::Public)
            .await
    }

    #[instrument(skip(self, request))]
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<(), ServiceError> {
        self.client
            .send_unit(Method::POST, "auth/reset-password", Some(request), Access::Public)
            .await
    }
}
