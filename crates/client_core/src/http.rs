use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    header::{CACHE_CONTROL, PRAGMA},
    Client, RequestBuilder, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Action, Card, CardId, Session, ThreadDetail, ThreadId, ThreadSummary, View},
    error::ApiError,
    protocol::{
        ActionRequest, ActionResponse, CardCheckRequest, ListThreadsQuery, LoginRequest,
        LoginResponse,
    },
    route::Route,
};
use storage::SessionStore;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    api::{AuthApi, ThreadApi},
    error::ClientError,
    navigator::Navigator,
};

/// HTTP implementation of the thread and auth contracts.
///
/// Every request carries the stored bearer token (when present) and disables caching.
/// A 401 on a protected request clears the session and navigates to the login route
/// before the error is handed back to the caller.
pub struct RemoteDataClient {
    http: Client,
    base_url: Url,
    sessions: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl RemoteDataClient {
    pub fn new(base_url: Url, sessions: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            sessions,
            navigator,
        }
    }

    pub fn from_base(
        base_url: &str,
        sessions: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let parsed =
            Url::parse(base_url).map_err(|_| ClientError::InvalidBaseUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(base_url.to_string()));
        }
        Ok(Self::new(parsed, sessions, navigator))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn no_cache(builder: RequestBuilder) -> RequestBuilder {
        builder
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = Self::no_cache(builder);
        match self.sessions.read() {
            Some(session) => builder.bearer_auth(session.token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = self.authorized(builder).send().await?;
        let response = self.check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(&self, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "http: response");
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.recover_auth();
        }
        let detail = response
            .json::<ApiError>()
            .await
            .ok()
            .map(|body| body.message);
        Err(ClientError::Request {
            status: status.as_u16(),
            detail,
        })
    }

    fn recover_auth(&self) {
        warn!("auth: server rejected credential; clearing session");
        self.sessions.clear();
        self.navigator.navigate(Route::Login);
    }
}

#[async_trait]
impl ThreadApi for RemoteDataClient {
    async fn list_threads(&self, view: View) -> Result<Vec<ThreadSummary>, ClientError> {
        let url = self.endpoint(&["threads"])?;
        self.execute(self.http.get(url).query(&ListThreadsQuery { view }))
            .await
    }

    async fn get_thread_detail(&self, id: &ThreadId) -> Result<ThreadDetail, ClientError> {
        let url = self.endpoint(&["threads", id.as_str()])?;
        self.execute(self.http.get(url)).await
    }

    async fn perform_action(
        &self,
        id: &ThreadId,
        action: Action,
    ) -> Result<ThreadDetail, ClientError> {
        let url = self.endpoint(&["threads", id.as_str(), "actions"])?;
        let response: ActionResponse = self
            .execute(self.http.post(url).json(&ActionRequest { action }))
            .await?;
        let thread = response.into_thread();
        info!(thread_id = %id, %action, view = %thread.view, "threads: action applied");
        Ok(thread)
    }

    async fn set_card_checked(
        &self,
        thread_id: &ThreadId,
        card_id: &CardId,
        checked: bool,
    ) -> Result<Card, ClientError> {
        let url = self.endpoint(&["threads", thread_id.as_str(), "cards", card_id.as_str()])?;
        let card: Card = self
            .execute(self.http.patch(url).json(&CardCheckRequest { checked }))
            .await?;
        info!(%thread_id, %card_id, checked = card.checked, "threads: card updated");
        Ok(card)
    }
}

#[async_trait]
impl AuthApi for RemoteDataClient {
    async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let email = email.trim();
        if email.is_empty() || password.trim().is_empty() {
            return Err(ClientError::InvalidCredentials);
        }

        let url = self.endpoint(&["auth", "login"])?;
        let response = Self::no_cache(self.http.post(url))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                info!(email, "auth: login rejected");
                return Err(ClientError::InvalidCredentials);
            }
            status => return Err(ClientError::status(status.as_u16())),
        }

        let body: LoginResponse = response.json().await?;
        if body.token.trim().is_empty() {
            return Err(ClientError::InvalidCredentials);
        }
        let session = Session::from(body);
        self.sessions.write(&session);
        info!(user_id = ?session.user_id, "auth: signed in");
        Ok(session)
    }

    async fn logout(&self) {
        if self.sessions.read().is_some() {
            match self.endpoint(&["auth", "logout"]) {
                Ok(url) => {
                    if let Err(error) = self.authorized(self.http.post(url)).send().await {
                        debug!(%error, "auth: remote logout failed; clearing locally");
                    }
                }
                Err(error) => debug!(%error, "auth: no logout endpoint"),
            }
        }
        self.sessions.clear();
        info!("auth: signed out");
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
