//! Session-aware request pipeline.
//!
//! # Design
//! - Every call goes through [`Pipeline::send`]: attach the bearer credential,
//!   dispatch, and recover from a 401 at most once.
//! - Retry accounting is an [`Attempt`] value owned by the `send` call, so
//!   concurrent requests never share retry state.
//! - Per logical call: at most two dispatches of the request plus one
//!   refresh exchange, strictly sequential.
//! - Failed refresh destroys the session and fires the [`LoginRedirect`]
//!   hook once per expiry, however many requests fail together.
//! - Non-401 statuses and transport failures are returned untouched.

use std::fmt;
use std::rc::Rc;

use comicshelf_api_models::{ErrorBody, RefreshRequest, RefreshResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::CredentialStore;
use crate::transport::{
    CONTENT_TYPE_JSON, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE, HEADER_REQUEST_ID, HttpRequest,
    HttpResponse, Method, Transport,
};

/// Token refresh endpoint.
pub const REFRESH_PATH: &str = "/auth/refresh/";

/// Side effect that sends the user to the unauthenticated entry point.
pub trait LoginRedirect {
    /// Navigate to login.
    fn redirect_to_login(&self);
}

impl<F: Fn()> LoginRedirect for F {
    fn redirect_to_login(&self) {
        self();
    }
}

/// Description of one logical API call.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the API base.
    pub path: String,
    /// Query pairs, encoded in order.
    pub query: Vec<(String, String)>,
    /// JSON body bytes.
    pub body: Option<Vec<u8>>,
    /// Public calls (login, register, refresh) never carry a credential and
    /// never enter 401 recovery.
    pub public: bool,
    /// Correlation id sent as `x-request-id` on every dispatch of this call.
    pub request_id: Uuid,
}

impl PendingRequest {
    /// Request without body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            public: false,
            request_id: Uuid::new_v4(),
        }
    }

    /// `GET path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// `DELETE path`.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    /// Returns [`ApiError::Encode`] when `body` cannot be serialized.
    pub fn post_json<B: Serialize + ?Sized>(
        path: impl Into<String>,
        body: &B,
    ) -> Result<Self, ApiError> {
        let bytes = serde_json::to_vec(body).map_err(|err| ApiError::Encode(err.to_string()))?;
        let mut request = Self::new(Method::Post, path);
        request.body = Some(bytes);
        Ok(request)
    }

    /// Append query pairs.
    #[must_use]
    pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// Mark as a public auth call.
    #[must_use]
    pub const fn public(mut self) -> Self {
        self.public = true;
        self
    }

    fn url(&self, config: &ClientConfig) -> String {
        let mut url = config.endpoint(&self.path);
        if !self.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body_len", &self.body.as_ref().map_or(0, Vec::len))
            .field("public", &self.public)
            .field("request_id", &self.request_id)
            .finish()
    }
}

/// Position of a dispatch within one logical call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// First dispatch.
    Initial,
    /// The single dispatch allowed after a successful refresh.
    AfterRefresh,
}

impl Attempt {
    /// Attempt that may follow a 401 on this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Initial => Some(Self::AfterRefresh),
            Self::AfterRefresh => None,
        }
    }

    /// One-based attempt number for logs.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Initial => 1,
            Self::AfterRefresh => 2,
        }
    }
}

/// Executes [`PendingRequest`]s against the API with credential recovery.
pub struct Pipeline<T> {
    config: ClientConfig,
    transport: T,
    credentials: Rc<CredentialStore>,
    redirect: Option<Rc<dyn LoginRedirect>>,
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("redirect", &self.redirect.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Pipeline<T> {
    /// Build a pipeline without a login redirect hook.
    #[must_use]
    pub fn new(config: ClientConfig, transport: T, credentials: Rc<CredentialStore>) -> Self {
        Self {
            config,
            transport,
            credentials,
            redirect: None,
        }
    }

    /// Install the hook fired when the session expires.
    #[must_use]
    pub fn with_login_redirect(mut self, hook: impl LoginRedirect + 'static) -> Self {
        self.redirect = Some(Rc::new(hook));
        self
    }

    /// Connection settings.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared credential store.
    #[must_use]
    pub const fn credentials(&self) -> &Rc<CredentialStore> {
        &self.credentials
    }

    /// Fire the login redirect hook, if installed.
    pub fn redirect_to_login(&self) {
        if let Some(hook) = &self.redirect {
            hook.redirect_to_login();
        }
    }

    /// Execute `request`, recovering from one authorization failure.
    ///
    /// Any status other than 401 is returned as `Ok` for the caller to
    /// classify. Public requests return their 401 unchanged.
    ///
    /// # Errors
    /// - [`ApiError::Network`] when the transport fails (never retried).
    /// - [`ApiError::AuthExpired`] when refresh is impossible or fails; the
    ///   session is cleared first.
    /// - [`ApiError::Unauthorized`] when the retry after a successful refresh
    ///   is still rejected; the session is cleared and no redirect fires.
    pub async fn send(&self, request: PendingRequest) -> Result<HttpResponse, ApiError> {
        let epoch = self.credentials.epoch();
        let mut attempt = Attempt::Initial;
        loop {
            let response = self.dispatch(&request, attempt).await?;
            if request.public || !response.is_unauthorized() {
                return Ok(response);
            }
            let Some(next) = attempt.next() else {
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    request_id = %request.request_id,
                    "request still unauthorized after refresh"
                );
                self.credentials.reject(epoch);
                return Err(ApiError::Unauthorized {
                    message: ErrorBody::parse(&response.body).and_then(|body| body.summary()),
                });
            };
            self.refresh(epoch).await?;
            attempt = next;
        }
    }

    async fn dispatch(
        &self,
        request: &PendingRequest,
        attempt: Attempt,
    ) -> Result<HttpResponse, ApiError> {
        let mut headers = vec![(
            HEADER_REQUEST_ID.to_string(),
            request.request_id.to_string(),
        )];
        if request.body.is_some() {
            headers.push((
                HEADER_CONTENT_TYPE.to_string(),
                CONTENT_TYPE_JSON.to_string(),
            ));
        }
        let token = if request.public {
            None
        } else {
            self.credentials.access_token()
        };
        let authenticated = token.is_some();
        if let Some(token) = token {
            headers.push((HEADER_AUTHORIZATION.to_string(), format!("Bearer {token}")));
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            attempt = attempt.number(),
            authenticated,
            request_id = %request.request_id,
            "dispatching request"
        );
        let outcome = self
            .transport
            .execute(HttpRequest {
                method: request.method,
                url: request.url(&self.config),
                headers,
                body: request.body.clone(),
            })
            .await;
        match outcome {
            Ok(response) => {
                tracing::debug!(
                    status = response.status,
                    path = %request.path,
                    request_id = %request.request_id,
                    "response received"
                );
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = %request.path,
                    request_id = %request.request_id,
                    "transport failure"
                );
                Err(err.into())
            }
        }
    }

    async fn refresh(&self, epoch: u64) -> Result<(), ApiError> {
        let Some(refresh) = self.credentials.refresh_token() else {
            return Err(self.expire(epoch, "no refresh token"));
        };
        let request = PendingRequest::post_json(REFRESH_PATH, &RefreshRequest { refresh })?.public();
        let response = match self.dispatch(&request, Attempt::Initial).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                return Err(self.expire(epoch, &format!("status {}", response.status)));
            }
            Err(err) => return Err(self.expire(epoch, &err.to_string())),
        };
        let tokens = match response.json::<RefreshResponse>() {
            Ok(tokens) => tokens,
            Err(err) => return Err(self.expire(epoch, &err.to_string())),
        };
        if self.credentials.apply_refresh(epoch, tokens) {
            tracing::info!("access token refreshed");
        } else {
            tracing::debug!("session changed during refresh; keeping the newer one");
        }
        Ok(())
    }

    fn expire(&self, epoch: u64, reason: &str) -> ApiError {
        tracing::warn!(reason, "token refresh failed; ending session");
        if self.credentials.expire(epoch) {
            self.redirect_to_login();
        }
        ApiError::AuthExpired
    }
}
