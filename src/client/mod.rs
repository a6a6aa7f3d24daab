//! Typed access to the cellar REST backend.
//!
//! Every request carries an `x-request-id` and, when a session is held, a
//! bearer token. A 401 on an authenticated call tears the session down
//! before the error is returned.

mod auth;
mod dashboard;
mod inventory;
mod logs;
mod transfer;
mod users;
mod wines;

pub use auth::AuthApi;
pub use dashboard::DashboardApi;
pub use inventory::InventoryApi;
pub use logs::LogsApi;
pub use transfer::{ExportFormat, ExportQuery, TransferApi};
pub use users::UsersApi;
pub use wines::WinesApi;

use bytes::Bytes;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::auth::SessionHandle;
use crate::config::ClientConfig;
use crate::errors::{extract_detail, ServiceError};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub(crate) const NO_QUERY: &[(&str, &str)] = &[];

/// Whether a call sends the session's bearer token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Access {
    Public,
    Bearer,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionHandle,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: SessionHandle) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ServiceError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: normalize_base_url(&config.api_base_url)?,
            session,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn wines(&self) -> WinesApi<'_> {
        WinesApi::new(self)
    }

    pub fn inventory(&self) -> InventoryApi<'_> {
        InventoryApi::new(self)
    }

    pub fn dashboard(&self) -> DashboardApi<'_> {
        DashboardApi::new(self)
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi::new(self)
    }

    pub fn logs(&self) -> LogsApi<'_> {
        LogsApi::new(self)
    }

    pub fn transfer(&self) -> TransferApi<'_> {
        TransferApi::new(self)
    }

    fn url(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ServiceError::InvalidOperation(format!("invalid path '{path}': {e}")))
    }

    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        access: Access,
    ) -> Result<RequestBuilder, ServiceError> {
        let mut builder = self
            .http
            .request(method, self.url(path)?)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        if access == Access::Bearer {
            if let Some(token) = self.session.token().await {
                builder = builder.bearer_auth(token);
            }
        }
        Ok(builder)
    }

    /// Sends the request and maps every non-success status to an error.
    #[instrument(skip(self, builder), fields(request_id = tracing::field::Empty))]
    pub(crate) async fn execute(
        &self,
        builder: RequestBuilder,
        access: Access,
    ) -> Result<Response, ServiceError> {
        let request = builder.build()?;
        let sent_token = request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);
        if let Some(id) = request.headers().get(REQUEST_ID_HEADER) {
            tracing::Span::current().record("request_id", id.to_str().unwrap_or_default());
        }
        debug!(method = %request.method(), url = %request.url(), "sending request");

        let response = self.http.execute(request).await.map_err(|e| {
            warn!(error = %e, "request failed before a response arrived");
            ServiceError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body);

        if status == StatusCode::UNAUTHORIZED && access == Access::Bearer {
            if let Some(token) = sent_token.as_deref() {
                if self.session.expire_if_current(token).await {
                    warn!("backend rejected credentials; session cleared");
                } else {
                    debug!("rejected token was already replaced; keeping session");
                }
            }
            return Err(ServiceError::Unauthorized(
                detail.unwrap_or_else(|| "Session expired, please log in again".to_string()),
            ));
        }

        warn!(%status, detail = detail.as_deref().unwrap_or(""), "request rejected");
        Err(ServiceError::from_response(status, detail))
    }

    pub(crate) async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T, ServiceError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path, Access::Bearer).await?.query(query);
        decode(self.execute(builder, Access::Bearer).await?).await
    }

    pub(crate) async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        access: Access,
    ) -> Result<T, ServiceError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(method, path, access).await?.json(body);
        decode(self.execute(builder, access).await?).await
    }

    /// Like [`send_json`](Self::send_json) but discards the response body.
    pub(crate) async fn send_unit<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        access: Access,
    ) -> Result<(), ServiceError>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(method, path, access).await?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder, access).await?;
        Ok(())
    }

    pub(crate) async fn get_bytes<Q>(&self, path: &str, query: &Q) -> Result<Bytes, ServiceError>
    where
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path, Access::Bearer).await?.query(query);
        let response = self.execute(builder, Access::Bearer).await?;
        Ok(response.bytes().await?)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ServiceError::from)
}

/// `join` drops the last path segment unless the base ends with `/`.
fn normalize_base_url(raw: &str) -> Result<Url, ServiceError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash)
        .map_err(|e| ServiceError::Config(format!("invalid api_base_url '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_api_prefix() {
        let url = normalize_base_url("http://localhost:8000/api").unwrap();
        assert_eq!(
            url.join("wines/low-stock").unwrap().as_str(),
            "http://localhost:8000/api/wines/low-stock"
        );
        let url = normalize_base_url("http://localhost:8000/api/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/");
    }

    #[test]
    fn rejects_garbage_base_url() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(ServiceError::Config(_))
        ));
    }

    #[test]
    fn leading_slash_paths_stay_under_base() {
        let client = ApiClient::new(
            &ClientConfig::with_base_url("http://cellar.test/api"),
            SessionHandle::in_memory(),
        )
        .unwrap();
        assert_eq!(
            client.url("/dashboard/summary").unwrap().as_str(),
            "http://cellar.test/api/dashboard/summary"
        );
    }
}
