//! Typed catalog API on top of the [`Pipeline`].
//!
//! # Design
//! - One method per endpoint; each builds a [`PendingRequest`], sends it
//!   through the pipeline, and maps non-success statuses to [`ApiError`].
//! - Login and registration are public calls; login installs the returned
//!   tokens in the shared [`CredentialStore`].
//! - Registration input is checked locally before anything is sent.

use std::rc::Rc;

use comicshelf_api_models::{
    AddCollectionRequest, CollectionEntry, CollectionId, ErrorBody, Item, ItemId, LoginRequest,
    Page, RegisterRequest, RegisterResponse, TokenPair, User,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::filters::{KEY_PAGE, ListParams};
use crate::pipeline::{PendingRequest, Pipeline};
use crate::session::CredentialStore;
use crate::transport::{HttpResponse, Transport};

/// Item listing endpoint.
pub const ITEMS_PATH: &str = "/items/";
/// Login endpoint.
pub const LOGIN_PATH: &str = "/auth/login/";
/// Registration endpoint.
pub const REGISTER_PATH: &str = "/auth/register/";
/// Current-user endpoint.
pub const ME_PATH: &str = "/auth/me/";
/// Collection endpoint.
pub const COLLECTIONS_PATH: &str = "/collections/";
/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Item detail path.
#[must_use]
pub fn item_path(id: ItemId) -> String {
    format!("{ITEMS_PATH}{id}/")
}

/// Collection entry path.
#[must_use]
pub fn collection_path(id: CollectionId) -> String {
    format!("{COLLECTIONS_PATH}{id}/")
}

/// Sign-up form contents.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Registration {
    /// Desired account name.
    pub username: String,
    /// Contact email; may be empty.
    pub email: String,
    /// Password.
    pub password: String,
    /// Password typed a second time.
    pub password_confirm: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Registration {
    /// Check the form before submitting it.
    ///
    /// # Errors
    /// Returns [`ApiError::InvalidInput`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.username.trim().is_empty() {
            return Err(ApiError::InvalidInput("username is required".to_string()));
        }
        if self.password != self.password_confirm {
            return Err(ApiError::InvalidInput("passwords do not match".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// Collection listings come back paginated or as a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Paged(Page<CollectionEntry>),
    Plain(Vec<CollectionEntry>),
}

/// Client for the catalog endpoints.
#[derive(Debug)]
pub struct CatalogApi<T> {
    pipeline: Pipeline<T>,
}

impl<T: Transport> CatalogApi<T> {
    /// Wrap a pipeline.
    #[must_use]
    pub const fn new(pipeline: Pipeline<T>) -> Self {
        Self { pipeline }
    }

    /// Underlying pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline<T> {
        &self.pipeline
    }

    /// Shared credential store.
    #[must_use]
    pub const fn credentials(&self) -> &Rc<CredentialStore> {
        self.pipeline.credentials()
    }

    /// Connection settings.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        self.pipeline.config()
    }

    /// One page of items.
    ///
    /// # Errors
    /// Any [`ApiError`] from the pipeline or the response status.
    pub async fn list_items(&self, params: &ListParams) -> Result<Page<Item>, ApiError> {
        let request = PendingRequest::get(ITEMS_PATH).with_query(params.to_query());
        self.fetch(request).await
    }

    /// Item detail.
    ///
    /// # Errors
    /// [`ApiError::NotFound`] for unknown ids; otherwise as [`Self::list_items`].
    pub async fn get_item(&self, id: ItemId) -> Result<Item, ApiError> {
        self.fetch(PendingRequest::get(item_path(id))).await
    }

    /// Exchange credentials for tokens and install them.
    ///
    /// # Errors
    /// [`ApiError::Unauthorized`] for bad credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let request = PendingRequest::post_json(LOGIN_PATH, &body)?.public();
        let tokens: TokenPair = self.fetch(request).await?;
        self.credentials().establish(tokens);
        tracing::info!(username, "signed in");
        Ok(())
    }

    /// Create an account.
    ///
    /// # Errors
    /// [`ApiError::InvalidInput`] before sending; [`ApiError::Validation`]
    /// when the server rejects the form (taken username, ...).
    pub async fn register(&self, form: &Registration) -> Result<RegisterResponse, ApiError> {
        form.validate()?;
        let body = RegisterRequest {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        };
        let request = PendingRequest::post_json(REGISTER_PATH, &body)?.public();
        self.fetch(request).await
    }

    /// Create an account, then sign in with it.
    ///
    /// # Errors
    /// As [`Self::register`] and [`Self::login`].
    pub async fn register_and_login(&self, form: &Registration) -> Result<User, ApiError> {
        let registered = self.register(form).await?;
        self.login(&registered.user.username, &form.password).await?;
        Ok(registered.user)
    }

    /// Account behind the current session.
    ///
    /// # Errors
    /// [`ApiError::AuthExpired`] when no usable session exists.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.fetch(PendingRequest::get(ME_PATH)).await
    }

    /// Drop the session locally.
    pub fn logout(&self) {
        self.credentials().logout();
        tracing::info!("signed out");
    }

    /// Every entry of the signed-in user's collection, across all pages.
    ///
    /// # Errors
    /// Any [`ApiError`]; partial results are discarded.
    pub async fn collections(&self) -> Result<Vec<CollectionEntry>, ApiError> {
        let mut entries = Vec::new();
        let mut page: u32 = 1;
        loop {
            let mut request = PendingRequest::get(COLLECTIONS_PATH);
            if page > 1 {
                request = request.with_query([(KEY_PAGE, page.to_string())]);
            }
            match self.fetch::<Listing>(request).await? {
                Listing::Plain(all) => return Ok(all),
                Listing::Paged(listing) => {
                    let done = listing.next.is_none() || listing.results.is_empty();
                    entries.extend(listing.results);
                    if done {
                        return Ok(entries);
                    }
                }
            }
            page += 1;
        }
    }

    /// Add an item to the collection.
    ///
    /// # Errors
    /// [`ApiError::Validation`] when the item is already collected.
    pub async fn add_to_collection(&self, item: ItemId) -> Result<CollectionEntry, ApiError> {
        let request =
            PendingRequest::post_json(COLLECTIONS_PATH, &AddCollectionRequest { item_id: item })?;
        self.fetch(request).await
    }

    /// Remove a collection entry.
    ///
    /// # Errors
    /// [`ApiError::NotFound`] when the entry is already gone.
    pub async fn remove_from_collection(&self, id: CollectionId) -> Result<(), ApiError> {
        let path = collection_path(id);
        let response = self.pipeline.send(PendingRequest::delete(&path)).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(classify(&path, &response))
        }
    }

    async fn fetch<R: DeserializeOwned>(&self, request: PendingRequest) -> Result<R, ApiError> {
        let path = request.path.clone();
        let response = self.pipeline.send(request).await?;
        if response.is_success() {
            response.json()
        } else {
            Err(classify(&path, &response))
        }
    }
}

/// Map a non-success response to the error callers see.
#[must_use]
pub fn classify(path: &str, response: &HttpResponse) -> ApiError {
    let body = ErrorBody::parse(&response.body);
    let message = body.as_ref().and_then(ErrorBody::summary);
    match response.status {
        400 | 409 | 422 => ApiError::Validation {
            status: response.status,
            message: message
                .unwrap_or_else(|| format!("request rejected with status {}", response.status)),
            fields: body.map(|body| body.fields).unwrap_or_default(),
        },
        401 => ApiError::Unauthorized { message },
        404 => ApiError::NotFound {
            path: path.to_string(),
        },
        status => ApiError::Status { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::FilterState;
    use crate::test_support::{ScriptedTransport, collection_page, entry_json, item_json};
    use comicshelf_api_models::SeriesStatus;

    fn api(transport: &Rc<ScriptedTransport>) -> CatalogApi<Rc<ScriptedTransport>> {
        let pipeline = Pipeline::new(
            ClientConfig::new("http://api.test/api"),
            Rc::clone(transport),
            Rc::new(CredentialStore::in_memory()),
        );
        CatalogApi::new(pipeline)
    }

    fn form(password: &str, confirm: &str) -> Registration {
        Registration {
            username: "reader".into(),
            email: "reader@example.com".into(),
            password: password.into(),
            password_confirm: confirm.into(),
        }
    }

    #[tokio::test]
    async fn list_items_sends_filter_params() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.push(
            200,
            &format!(
                r#"{{"count":41,"next":null,"previous":null,"results":[{}]}}"#,
                item_json(3)
            ),
        );
        let api = api(&transport);
        let params = FilterState::decode("status_jp=ongoing&page=3").to_list_params(20);

        let page = api.list_items(&params).await.expect("list");

        assert_eq!(page.count, 41);
        assert_eq!(page.results[0].status, SeriesStatus::Ongoing);
        assert_eq!(
            transport.requests()[0].url,
            "http://api.test/api/items/?status_jp=ongoing&ordering=-id&page=3&page_size=20"
        );
    }

    #[tokio::test]
    async fn missing_item_maps_to_not_found() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.push(404, r#"{"detail":"Not found."}"#);
        let err = api(&transport)
            .get_item(ItemId(99))
            .await
            .expect_err("missing");
        assert_eq!(
            err,
            ApiError::NotFound {
                path: "/items/99/".into()
            }
        );
    }

    #[tokio::test]
    async fn login_installs_tokens() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.push(200, r#"{"access":"a","refresh":"r"}"#);
        let api = api(&transport);

        api.login("reader", "secret1").await.expect("login");

        assert_eq!(api.credentials().access_token().as_deref(), Some("a"));
        let sent = &transport.requests()[0];
        assert_eq!(sent.url, "http://api.test/api/auth/login/");
        assert_eq!(sent.bearer(), None);
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized_without_redirect() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.push(
            401,
            r#"{"detail":"No active account found with the given credentials"}"#,
        );
        let err = api(&transport)
            .login("reader", "wrong")
            .await
            .expect_err("rejected");
        assert_eq!(
            err.user_message(),
            "No active account found with the given credentials"
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn registration_is_validated_before_sending() {
        let transport = Rc::new(ScriptedTransport::new());
        let api = api(&transport);

        let mismatch = api.register(&form("secret1", "secret2")).await;
        assert_eq!(
            mismatch.expect_err("mismatch"),
            ApiError::InvalidInput("passwords do not match".into())
        );
        let short = api.register(&form("abc", "abc")).await;
        assert!(matches!(short, Err(ApiError::InvalidInput(_))));
        let mut blank = form("secret1", "secret1");
        blank.username = "  ".into();
        assert!(matches!(
            api.register(&blank).await,
            Err(ApiError::InvalidInput(_))
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn register_then_login() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.push(
            201,
            r#"{"message":"ok","user":{"id":4,"username":"reader","email":"reader@example.com"}}"#,
        );
        transport.push(200, r#"{"access":"a","refresh":"r"}"#);
        let api = api(&transport);

        let user = api
            .register_and_login(&form("secret1", "secret1"))
            .await
            .expect("registered");

        assert_eq!(user.id, 4);
        assert!(api.credentials().is_authenticated());
        let sent = transport.requests();
        assert_eq!(sent[0].url, "http://api.test/api/auth/register/");
        assert_eq!(sent[1].url, "http://api.test/api/auth/login/");
    }

    #[tokio::test]
    async fn taken_username_surfaces_server_message() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.push(400, r#"{"error":"username already exists"}"#);
        let err = api(&transport)
            .register(&form("secret1", "secret1"))
            .await
            .expect_err("taken");
        assert_eq!(err.user_message(), "username already exists");
    }

    #[tokio::test]
    async fn collections_follow_pagination() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.push(
            200,
            &format!(
                r#"{{"count":2,"next":"http://api.test/api/collections/?page=2","previous":null,"results":[{}]}}"#,
                entry_json(1, 10)
            ),
        );
        transport.push(200, &collection_page(&[(2, 20)]));
        let entries = api(&transport).collections().await.expect("collections");

        let ids: Vec<u64> = entries.iter().map(|entry| entry.item.id.0).collect();
        assert_eq!(ids, vec![10, 20]);
        assert_eq!(
            transport.requests()[1].url,
            "http://api.test/api/collections/?page=2"
        );
    }

    #[tokio::test]
    async fn duplicate_add_is_a_validation_error() {
        let transport = Rc::new(ScriptedTransport::new());
        transport.push(
            400,
            r#"{"non_field_errors":["The fields user, series must make a unique set."]}"#,
        );
        let err = api(&transport)
            .add_to_collection(ItemId(42))
            .await
            .expect_err("duplicate");
        let ApiError::Validation {
            status, message, ..
        } = &err
        else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(*status, 400);
        assert_eq!(message, "The fields user, series must make a unique set.");
        assert_eq!(
            transport.requests()[0].body.as_deref(),
            Some(&br#"{"item_id":42}"#[..])
        );
    }

    #[test]
    fn server_errors_pass_through_as_status() {
        let err = classify("/items/", &HttpResponse::new(503, "unavailable"));
        assert_eq!(
            err,
            ApiError::Status {
                status: 503,
                message: None
            }
        );
    }
}
