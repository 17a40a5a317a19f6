//! Shared catalog client context.
//!
//! # Design
//! - Create exactly one pipeline, credential store, and collection cache per app boot.
//! - The login redirect needs the router's navigator, which only exists
//!   below `BrowserRouter`; it is installed into a slot after mount.

use std::cell::RefCell;
use std::rc::Rc;

use comicshelf_client::{CatalogApi, ClientConfig, CollectionCache, CredentialStore, Pipeline};
use gloo::console;
use yew_router::prelude::Navigator;
use yewdux::prelude::Dispatch;

use crate::app::routes::Route;
use crate::core::store::{AppStore, bump_collection, sync_session};
use crate::services::storage::LocalTokenStorage;
use crate::services::transport::GlooTransport;

/// Catalog API over the browser transport.
pub(crate) type BrowserApi = CatalogApi<GlooTransport>;

/// Shared client context for components.
#[derive(Clone)]
pub(crate) struct ApiCtx {
    pub(crate) api: Rc<BrowserApi>,
    pub(crate) collections: Rc<CollectionCache<GlooTransport>>,
    navigator: Rc<RefCell<Option<Navigator>>>,
}

impl ApiCtx {
    pub(crate) fn new(base_url: impl Into<String>) -> Self {
        let config = ClientConfig::new(base_url);
        let transport = GlooTransport::new(config.timeout);
        let credentials = Rc::new(CredentialStore::new(LocalTokenStorage));
        let navigator: Rc<RefCell<Option<Navigator>>> = Rc::new(RefCell::new(None));

        let redirect = {
            let navigator = Rc::clone(&navigator);
            let credentials = Rc::clone(&credentials);
            move || {
                Dispatch::<AppStore>::new().reduce_mut(|store| {
                    sync_session(store, credentials.is_authenticated(), credentials.epoch());
                });
                let navigator = navigator.borrow().clone();
                match navigator {
                    Some(navigator) => navigator.push(&Route::Login),
                    None => console::warn!("login redirect requested before the router mounted"),
                }
            }
        };
        let pipeline = Pipeline::new(config, transport, credentials).with_login_redirect(redirect);
        let api = Rc::new(CatalogApi::new(pipeline));
        let collections = Rc::new(CollectionCache::new(Rc::clone(&api)));
        collections.set_on_change(|| Dispatch::<AppStore>::new().reduce_mut(bump_collection));

        Self {
            api,
            collections,
            navigator,
        }
    }

    pub(crate) fn install_navigator(&self, navigator: Navigator) {
        *self.navigator.borrow_mut() = Some(navigator);
    }

    /// Copy the credential store's state into the UI store.
    pub(crate) fn sync_session(&self) {
        let credentials = self.api.credentials();
        let (authenticated, epoch) = (credentials.is_authenticated(), credentials.epoch());
        Dispatch::<AppStore>::new().reduce_mut(|store| sync_session(store, authenticated, epoch));
    }
}

impl PartialEq for ApiCtx {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.api, &other.api)
    }
}
