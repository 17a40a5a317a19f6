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
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::redundant_pub_crate)]
//! ComicShelf browser shell.
//!
//! `core` is DOM-free (store slices, location helpers) and builds natively;
//! the Yew app, components and browser services only exist on wasm32.

pub mod core;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod components;
#[cfg(target_arch = "wasm32")]
mod services;

#[cfg(target_arch = "wasm32")]
pub use app::run_app;
