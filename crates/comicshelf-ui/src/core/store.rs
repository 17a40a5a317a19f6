//! App-wide yewdux store slices.
//!
//! # Design
//! - The credential store owns tokens; the UI store only mirrors what views
//!   render (signed-in flag, display name, collection revision).
//! - Reducers are plain functions so they are testable without a DOM.

use yewdux::store::Store;

/// Global application store for shared state.
#[derive(Clone, Debug, PartialEq, Eq, Store, Default)]
pub struct AppStore {
    /// Mirror of the credential store.
    pub session: SessionSlice,
    /// Bumped whenever the collection cache reports a change.
    pub collection_revision: u64,
    /// Transient banner message.
    pub flash: Option<Flash>,
}

/// What views need to know about the session.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SessionSlice {
    /// Whether requests carry a credential.
    pub authenticated: bool,
    /// Session generation the slice was last synced with.
    pub epoch: u64,
    /// Display name from `/auth/me/`, once loaded.
    pub username: Option<String>,
}

/// Banner severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashKind {
    /// Confirmation.
    Success,
    /// Failure the user should read.
    Error,
}

/// Banner shown at the top of the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flash {
    /// Severity.
    pub kind: FlashKind,
    /// Text.
    pub message: String,
}

/// Sync the session slice with the credential store. A new generation drops
/// the cached display name.
pub fn sync_session(store: &mut AppStore, authenticated: bool, epoch: u64) {
    if store.session.epoch != epoch || !authenticated {
        store.session.username = None;
    }
    store.session.authenticated = authenticated;
    store.session.epoch = epoch;
}

/// Record the display name fetched for session `epoch`; stale answers are dropped.
pub fn set_username(store: &mut AppStore, epoch: u64, username: String) {
    if store.session.authenticated && store.session.epoch == epoch {
        store.session.username = Some(username);
    }
}

/// Note that collection membership changed.
pub fn bump_collection(store: &mut AppStore) {
    store.collection_revision = store.collection_revision.wrapping_add(1);
}

/// Show a banner.
pub fn set_flash(store: &mut AppStore, kind: FlashKind, message: impl Into<String>) {
    store.flash = Some(Flash {
        kind,
        message: message.into(),
    });
}

/// Hide the banner.
pub fn clear_flash(store: &mut AppStore) {
    store.flash = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_generation_drops_username() {
        let mut store = AppStore::default();
        sync_session(&mut store, true, 1);
        set_username(&mut store, 1, "reader".to_string());
        assert_eq!(store.session.username.as_deref(), Some("reader"));

        sync_session(&mut store, true, 1);
        assert_eq!(store.session.username.as_deref(), Some("reader"));

        sync_session(&mut store, true, 2);
        assert_eq!(store.session.username, None);
    }

    #[test]
    fn stale_username_is_ignored() {
        let mut store = AppStore::default();
        sync_session(&mut store, true, 3);
        set_username(&mut store, 2, "old".to_string());
        assert_eq!(store.session.username, None);

        sync_session(&mut store, false, 4);
        set_username(&mut store, 4, "ghost".to_string());
        assert_eq!(store.session.username, None);
    }

    #[test]
    fn flash_and_revision_reducers() {
        let mut store = AppStore::default();
        bump_collection(&mut store);
        bump_collection(&mut store);
        assert_eq!(store.collection_revision, 2);

        set_flash(&mut store, FlashKind::Error, "already in your collection");
        assert_eq!(
            store.flash.as_ref().map(|flash| flash.kind),
            Some(FlashKind::Error)
        );
        clear_flash(&mut store);
        assert!(store.flash.is_none());
    }
}
