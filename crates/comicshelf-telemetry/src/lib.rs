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

//! Logging setup shared by the ComicShelf native binaries.
//!
//! The browser shell does not use this crate; it reports through the
//! console directly.

mod init;

pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, client_label, init_logging};
