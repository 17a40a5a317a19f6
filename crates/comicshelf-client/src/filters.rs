//! Filter state and its URL query-string form.
//!
//! # Design
//! - [`FilterState::decode`] / [`FilterState::encode`] are the only mapping
//!   between state and query string; `encode(decode(q))` is canonical and
//!   stable under repeated round-trips.
//! - Keys are written in a fixed order and default values are omitted, so
//!   one state has exactly one query string.
//! - User edits go through [`FilterChange`] reducers; anything other than a
//!   page change resets pagination to the first page.
//! - [`FilterUrlSync`] remembers the last query it wrote so a navigation
//!   event echoing that query is recognised and never rewrites the URL.

use std::fmt;

use comicshelf_api_models::SeriesStatus;

/// Query key for free-text search.
pub const KEY_SEARCH: &str = "search";
/// Query key for the publication status filter.
pub const KEY_STATUS: &str = "status_jp";
/// Query key for the genre filter.
pub const KEY_GENRE: &str = "genre";
/// Query key for the first-publication year filter.
pub const KEY_YEAR: &str = "year";
/// Query key for sort order.
pub const KEY_ORDERING: &str = "ordering";
/// Query key for the page number.
pub const KEY_PAGE: &str = "page";
/// Query key for the page size (API only, never in the address bar).
pub const KEY_PAGE_SIZE: &str = "page_size";

/// Sort orders accepted by the list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Most recently added first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Localised title, A to Z.
    TitleTw,
    /// Localised title, Z to A.
    TitleTwDesc,
    /// Japanese title, A to Z.
    TitleJp,
    /// Japanese title, Z to A.
    TitleJpDesc,
    /// First published, earliest first.
    Year,
    /// First published, latest first.
    YearDesc,
}

impl SortOrder {
    /// Every ordering, in menu order.
    pub const ALL: [Self; 8] = [
        Self::Newest,
        Self::Oldest,
        Self::TitleTw,
        Self::TitleTwDesc,
        Self::TitleJp,
        Self::TitleJpDesc,
        Self::Year,
        Self::YearDesc,
    ];

    /// Wire value (`ordering=`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "-id",
            Self::Oldest => "id",
            Self::TitleTw => "title_tw",
            Self::TitleTwDesc => "-title_tw",
            Self::TitleJp => "title_jp",
            Self::TitleJpDesc => "-title_jp",
            Self::Year => "first_published_year",
            Self::YearDesc => "-first_published_year",
        }
    }

    /// Parse a wire value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ordering| ordering.as_str() == value.trim())
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::Oldest => "Oldest",
            Self::TitleTw => "Title (A-Z)",
            Self::TitleTwDesc => "Title (Z-A)",
            Self::TitleJp => "Japanese title (A-Z)",
            Self::TitleJpDesc => "Japanese title (Z-A)",
            Self::Year => "First published (earliest)",
            Self::YearDesc => "First published (latest)",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which [`FilterState`] fields are part of the address-bar contract.
///
/// Search, status, genre and year are always included; sort order and page
/// are opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrlContract {
    /// Write `ordering` when it differs from the default.
    pub include_ordering: bool,
    /// Write `page` when it is past the first page.
    pub include_page: bool,
}

impl UrlContract {
    /// Only the bookmarkable filter keys.
    pub const FILTERS_ONLY: Self = Self {
        include_ordering: false,
        include_page: false,
    };

    /// Filters plus sort order and page.
    pub const FULL: Self = Self {
        include_ordering: true,
        include_page: true,
    };
}

/// Search, filter, sort and page parameters of the listing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// Free-text search.
    pub search: String,
    /// Publication status filter.
    pub status: Option<SeriesStatus>,
    /// Genre filter.
    pub genre: String,
    /// First-publication year filter.
    pub year: Option<i32>,
    /// Sort order.
    pub ordering: SortOrder,
    /// One-based page number.
    pub page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            genre: String::new(),
            year: None,
            ordering: SortOrder::default(),
            page: 1,
        }
    }
}

/// A single user edit to the filter state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
    /// Replace the search text.
    Search(String),
    /// Replace the status filter.
    Status(Option<SeriesStatus>),
    /// Replace the genre filter.
    Genre(String),
    /// Replace the year filter.
    Year(Option<i32>),
    /// Replace the sort order.
    Sort(SortOrder),
    /// Submit of the filter form: search, genre and year in one edit.
    /// Leaves the state untouched when none of them differ.
    Form {
        /// Search text.
        search: String,
        /// Genre filter.
        genre: String,
        /// Year filter.
        year: Option<i32>,
    },
    /// Jump to a page.
    Page(u32),
    /// Clear status, genre and year; search text and sort order survive.
    Reset,
}

impl FilterState {
    /// Read recognised keys from a query string (with or without a leading `?`).
    ///
    /// Unrecognised keys are ignored, unparseable values fall back to the
    /// field default, and the first occurrence of a repeated key wins.
    #[must_use]
    pub fn decode(query: &str) -> Self {
        let mut state = Self::default();
        let mut seen: Vec<String> = Vec::new();
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if seen.iter().any(|known| *known == key) {
                continue;
            }
            seen.push(key.to_string());
            match key.as_ref() {
                KEY_SEARCH => state.search = value.into_owned(),
                KEY_STATUS => state.status = SeriesStatus::parse(&value),
                KEY_GENRE => state.genre = value.into_owned(),
                KEY_YEAR => state.year = value.trim().parse().ok(),
                KEY_ORDERING => state.ordering = SortOrder::parse(&value).unwrap_or_default(),
                KEY_PAGE => {
                    state.page = value
                        .trim()
                        .parse()
                        .ok()
                        .filter(|page| *page >= 1)
                        .unwrap_or(1);
                }
                _ => {}
            }
        }
        state
    }

    /// Full query string (without `?`) for this state under `contract`.
    #[must_use]
    pub fn encode(&self, contract: UrlContract) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if !self.search.is_empty() {
            query.append_pair(KEY_SEARCH, &self.search);
        }
        if let Some(status) = self.status {
            query.append_pair(KEY_STATUS, status.as_str());
        }
        if !self.genre.is_empty() {
            query.append_pair(KEY_GENRE, &self.genre);
        }
        if let Some(year) = self.year {
            query.append_pair(KEY_YEAR, &year.to_string());
        }
        if contract.include_ordering && self.ordering != SortOrder::default() {
            query.append_pair(KEY_ORDERING, self.ordering.as_str());
        }
        if contract.include_page && self.page > 1 {
            query.append_pair(KEY_PAGE, &self.page.to_string());
        }
        query.finish()
    }

    /// State after applying `change`.
    #[must_use]
    pub fn apply(&self, change: FilterChange) -> Self {
        let mut next = self.clone();
        match change {
            FilterChange::Page(page) => {
                next.page = page.max(1);
                return next;
            }
            FilterChange::Search(search) => next.search = search,
            FilterChange::Status(status) => next.status = status,
            FilterChange::Genre(genre) => next.genre = genre,
            FilterChange::Year(year) => next.year = year,
            FilterChange::Sort(order) => next.ordering = order,
            FilterChange::Form {
                search,
                genre,
                year,
            } => {
                if search == self.search && genre == self.genre && year == self.year {
                    return next;
                }
                next.search = search;
                next.genre = genre;
                next.year = year;
            }
            FilterChange::Reset => {
                next.status = None;
                next.genre = String::new();
                next.year = None;
            }
        }
        next.page = 1;
        next
    }

    /// Whether any of status, genre or year is set.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        self.status.is_some() || !self.genre.is_empty() || self.year.is_some()
    }

    /// Parameters for the list request this state describes.
    #[must_use]
    pub fn to_list_params(&self, page_size: u32) -> ListParams {
        ListParams {
            search: Some(self.search.trim().to_string()).filter(|search| !search.is_empty()),
            status: self.status,
            genre: Some(self.genre.clone()).filter(|genre| !genre.is_empty()),
            year: self.year,
            ordering: self.ordering,
            page: self.page,
            page_size,
        }
    }

    fn same_filters(&self, other: &Self) -> bool {
        self.search == other.search
            && self.status == other.status
            && self.genre == other.genre
            && self.year == other.year
    }
}

/// Query parameters of `GET /items/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Search text, trimmed; absent when blank.
    pub search: Option<String>,
    /// Status filter.
    pub status: Option<SeriesStatus>,
    /// Genre filter.
    pub genre: Option<String>,
    /// Year filter.
    pub year: Option<i32>,
    /// Sort order; always sent.
    pub ordering: SortOrder,
    /// One-based page.
    pub page: u32,
    /// Results per page.
    pub page_size: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        FilterState::default().to_list_params(crate::config::DEFAULT_PAGE_SIZE)
    }
}

impl ListParams {
    /// Ordered query pairs.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(7);
        if let Some(search) = &self.search {
            pairs.push((KEY_SEARCH.to_string(), search.clone()));
        }
        if let Some(status) = self.status {
            pairs.push((KEY_STATUS.to_string(), status.as_str().to_string()));
        }
        if let Some(genre) = &self.genre {
            pairs.push((KEY_GENRE.to_string(), genre.clone()));
        }
        if let Some(year) = self.year {
            pairs.push((KEY_YEAR.to_string(), year.to_string()));
        }
        pairs.push((KEY_ORDERING.to_string(), self.ordering.as_str().to_string()));
        pairs.push((KEY_PAGE.to_string(), self.page.to_string()));
        pairs.push((KEY_PAGE_SIZE.to_string(), self.page_size.to_string()));
        pairs
    }
}

/// Address-bar location for a search shortcut, `None` when the text is blank.
#[must_use]
pub fn search_location(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let state = FilterState {
        search: text.to_string(),
        ..FilterState::default()
    };
    Some(format!("/items?{}", state.encode(UrlContract::FILTERS_ONLY)))
}

/// Keeps a [`FilterState`] and the address bar in step.
#[derive(Debug, Clone)]
pub struct FilterUrlSync {
    contract: UrlContract,
    state: FilterState,
    last_query: String,
}

impl FilterUrlSync {
    /// Start from the query string present when the view mounts.
    #[must_use]
    pub fn new(contract: UrlContract, query: &str) -> Self {
        let state = FilterState::decode(query);
        let last_query = state.encode(contract);
        Self {
            contract,
            state,
            last_query,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    /// Contract in force.
    #[must_use]
    pub const fn contract(&self) -> UrlContract {
        self.contract
    }

    /// Canonical query string last read or written.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.last_query
    }

    /// The address bar changed (link, back/forward, or the echo of our own
    /// write). Returns whether the state changed. Never asks for a URL write.
    pub fn on_navigation(&mut self, query: &str) -> bool {
        let decoded = FilterState::decode(query);
        let canonical = decoded.encode(self.contract);
        if canonical == self.last_query {
            return false;
        }
        let mut next = decoded;
        if !self.contract.include_ordering {
            next.ordering = self.state.ordering;
        }
        if !self.contract.include_page && next.same_filters(&self.state) {
            next.page = self.state.page;
        }
        self.last_query = canonical;
        let changed = next != self.state;
        self.state = next;
        changed
    }

    /// Apply a user edit. Returns the full query string to write (replacing
    /// the current URL entry) when it differs from what the URL holds.
    pub fn on_user_change(&mut self, change: FilterChange) -> Option<String> {
        self.state = self.state.apply(change);
        let query = self.state.encode(self.contract);
        if query == self.last_query {
            return None;
        }
        self.last_query.clone_from(&query);
        Some(query)
    }
}
