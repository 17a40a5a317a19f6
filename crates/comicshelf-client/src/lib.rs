#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![deny(unused_must_use)]
#![allow(clippy::redundant_pub_crate)]

//! Client core shared by the ComicShelf browser shell and CLI.
//!
//! Layout:
//! - `session.rs`: credential store and token persistence seam
//! - `transport.rs`: HTTP seam (`reqwest` behind the `native` feature)
//! - `pipeline.rs`: bearer attachment, single refresh-and-retry, expiry redirect
//! - `api.rs`: typed catalog endpoints and status classification
//! - `collections.rs`: collection membership cache
//! - `filters.rs`: filter state and URL query synchronisation
//! - `scope.rs`: view liveness token
//! - `config.rs` / `error.rs`: settings and error types
//!
//! Everything runs on a single cooperative executor; shared state uses
//! `Rc` with `Cell`/`RefCell` and no borrow is held across an await.

pub mod api;
pub mod collections;
pub mod config;
pub mod error;
pub mod filters;
pub mod pipeline;
pub mod scope;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{CatalogApi, Registration};
pub use collections::{CollectionCache, ToggleOutcome};
pub use config::ClientConfig;
pub use error::{ApiError, StorageError, TransportError};
pub use filters::{
    FilterChange, FilterState, FilterUrlSync, ListParams, SortOrder, UrlContract, search_location,
};
pub use pipeline::{LoginRedirect, PendingRequest, Pipeline};
pub use scope::ViewScope;
pub use session::{CredentialStore, MemoryTokenStorage, Session, TokenStorage};
pub use transport::{HttpRequest, HttpResponse, Method, Transport};

#[cfg(feature = "native")]
pub use transport::ReqwestTransport;
