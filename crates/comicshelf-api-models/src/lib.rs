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
//! Shared HTTP DTOs for the ComicShelf catalog API.
//!
//! These types are re-used by the browser shell and the CLI so the wire
//! contract stays in one place. Field names follow the server serializers;
//! Rust-side names are normalised through `serde(rename)` where they differ.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Catalog item (series) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a collection entry (not the item it points at).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub u64);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Publication status of a series in Japan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStatus {
    /// Still being serialised.
    Ongoing,
    /// Finished.
    Completed,
    /// Paused by the publisher or author.
    Hiatus,
    /// Any status value this client does not know about.
    #[serde(other)]
    Unknown,
}

impl SeriesStatus {
    /// Statuses a user can filter by.
    pub const FILTERABLE: [Self; 3] = [Self::Ongoing, Self::Completed, Self::Hiatus];

    /// Wire value used in query strings (`status_jp=`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Hiatus => "hiatus",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a query-string value; unknown values are rejected.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "ongoing" => Some(Self::Ongoing),
            "completed" => Some(Self::Completed),
            "hiatus" => Some(Self::Hiatus),
            _ => None,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ongoing => "Ongoing",
            Self::Completed => "Completed",
            Self::Hiatus => "On hiatus",
            Self::Unknown => "Unknown",
        }
    }
}

/// Publishing region for volumes and publishers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Japanese edition.
    #[serde(rename = "JP")]
    Japan,
    /// Taiwanese edition.
    #[serde(rename = "TW")]
    Taiwan,
}

/// Single published volume of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Volume identifier.
    pub id: u64,
    /// Volume number, absent for specials.
    pub volume_number: Option<u32>,
    /// Edition region.
    pub region: Region,
    #[serde(default)]
    /// Variant label (e.g. limited edition).
    pub variant: String,
    /// Release date when known.
    pub release_date: Option<NaiveDate>,
    /// ISBN when known.
    pub isbn: Option<String>,
    /// Publisher identifier.
    pub publisher: Option<u64>,
    /// Publisher display name.
    pub publisher_name: Option<String>,
}

/// Catalog item as returned by the list and detail endpoints.
///
/// The detail endpoint adds `volumes` and the latest volume numbers; those
/// fields default to empty when reading list payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier.
    pub id: ItemId,
    /// Traditional Chinese title, when localised.
    #[serde(rename = "traditional_chinese_title")]
    pub title_tw: Option<String>,
    /// Original Japanese title.
    #[serde(rename = "japanese_title")]
    pub title_jp: String,
    #[serde(default)]
    /// Author display name.
    pub author: String,
    /// Publication status in Japan.
    #[serde(rename = "status_japan")]
    pub status: SeriesStatus,
    #[serde(default)]
    /// Genre labels.
    pub genres: Vec<String>,
    #[serde(default)]
    /// Year of first publication.
    pub first_published_year: Option<i32>,
    #[serde(default)]
    /// Latest Japanese volume number.
    pub latest_volume_jp_number: Option<u32>,
    #[serde(default)]
    /// Latest Taiwanese volume number.
    pub latest_volume_tw_number: Option<u32>,
    #[serde(default)]
    /// Volumes (detail payloads only).
    pub volumes: Vec<Volume>,
    #[serde(default)]
    /// Cover image URL.
    pub cover_image: Option<String>,
}

impl Item {
    /// Title to show: the localised title when present, else the Japanese one.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title_tw
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(&self.title_jp)
    }
}

/// Paginated list envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    /// Total number of results across all pages.
    pub count: u64,
    #[serde(default)]
    /// URL of the next page.
    pub next: Option<String>,
    #[serde(default)]
    /// URL of the previous page.
    pub previous: Option<String>,
    /// Results on this page.
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Whether the server advertised a following page.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Whether the server advertised a preceding page.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.previous.is_some()
    }
}

/// Number of pages needed for `count` results.
#[must_use]
pub const fn total_pages(count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size as u64)
}

/// Login request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Access/refresh pair issued on login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub access: String,
    /// Long-lived token exchanged for new access tokens.
    pub refresh: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Refresh request body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token to exchange.
    pub refresh: String,
}

/// Refresh response; servers that rotate refresh tokens also return `refresh`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token.
    pub access: String,
    #[serde(default)]
    /// Rotated refresh token, when issued.
    pub refresh: Option<String>,
}

/// Registration request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Desired account name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Registration response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    /// Server confirmation message.
    pub message: Option<String>,
    /// The created account.
    pub user: User,
}

/// Authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Account identifier.
    pub id: u64,
    /// Account name.
    pub username: String,
    #[serde(default)]
    /// Contact email.
    pub email: String,
    #[serde(default)]
    /// Account creation time.
    pub date_joined: Option<DateTime<Utc>>,
}

/// Entry in the authenticated user's collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    /// Entry identifier, used for removal.
    pub id: CollectionId,
    /// Collected item.
    #[serde(alias = "series")]
    pub item: Item,
    /// When the item was added.
    #[serde(alias = "created_at")]
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    /// Free-form user notes.
    pub notes: Option<String>,
}

/// Body for adding an item to the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCollectionRequest {
    /// Item to add.
    pub item_id: ItemId,
}

/// Error payload in the server's validation shape.
///
/// Accepts `{"detail": ".."}`, `{"error": ".."}`, `{"field": ["msg", ..]}`,
/// bare lists and bare strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorBody {
    /// Top-level message, when present.
    pub detail: Option<String>,
    /// Per-field messages.
    pub fields: BTreeMap<String, Vec<String>>,
}

const NON_FIELD_ERRORS: &str = "non_field_errors";

impl ErrorBody {
    /// Parse a response body; returns `None` when it is not JSON.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let value: Value = serde_json::from_slice(bytes).ok()?;
        Some(Self::from_value(&value))
    }

    fn from_value(value: &Value) -> Self {
        let mut body = Self::default();
        match value {
            Value::Object(map) => {
                for (key, entry) in map {
                    match key.as_str() {
                        "detail" | "error" | "message" if body.detail.is_none() => {
                            body.detail = messages(entry).into_iter().next();
                        }
                        _ => {
                            body.fields.insert(key.clone(), messages(entry));
                        }
                    }
                }
            }
            Value::Array(_) => {
                body.fields
                    .insert(NON_FIELD_ERRORS.to_string(), messages(value));
            }
            Value::String(text) => body.detail = Some(text.clone()),
            _ => {}
        }
        body
    }

    /// Single message suitable for display: the detail, else the first field message.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        self.detail.clone().or_else(|| {
            self.fields
                .values()
                .flat_map(|messages| messages.iter())
                .next()
                .cloned()
        })
    }
}

fn messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => vec![text.clone()],
        Value::Array(items) => items.iter().flat_map(messages).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}
