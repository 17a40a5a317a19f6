//! Client-side mirror of the signed-in user's collection.
//!
//! # Design
//! - Membership answers are projections of the last full server fetch;
//!   there is no local insert/delete path.
//! - A successful add/remove invalidates the mirror and refetches the whole
//!   set before `toggle` returns. Failed mutations leave it untouched.
//! - Each item has a busy flag, set before the first await of a toggle;
//!   a second toggle on a busy item is rejected without a request.
//! - Fetches are ticketed: a response older than the one already applied
//!   is dropped, so overlapping refetches cannot roll the mirror back.
//! - Invalidation is a barrier: only fetches issued after it may land and
//!   mark the mirror fresh again.
//! - If the refetch after a mutation fails, reads keep serving the last
//!   fetch but [`CollectionCache::is_fresh`] reports false, and the next
//!   [`CollectionCache::ensure_loaded`] or toggle refetches first.
//! - The mirror is tied to the session epoch; after login/logout/expiry it
//!   reads as empty until refetched.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use comicshelf_api_models::{CollectionEntry, CollectionId, ItemId};

use crate::api::CatalogApi;
use crate::error::ApiError;
use crate::transport::Transport;

/// Result of a [`CollectionCache::toggle`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The item was added and the refetched set includes it.
    Added,
    /// The item was removed and the refetched set excludes it.
    Removed,
    /// A toggle for this item is already in flight; nothing was sent.
    Busy,
    /// No session; the login redirect fired and nothing was sent.
    LoginRequired,
}

#[derive(Default)]
struct Mirror {
    entries: Vec<CollectionEntry>,
    epoch: Option<u64>,
    stale: bool,
}

/// Membership cache shared by every view.
pub struct CollectionCache<T> {
    api: Rc<CatalogApi<T>>,
    mirror: RefCell<Mirror>,
    busy: RefCell<HashSet<ItemId>>,
    issued: Cell<u64>,
    applied: Cell<u64>,
    on_change: RefCell<Option<Rc<dyn Fn()>>>,
}

impl<T> fmt::Debug for CollectionCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mirror = self.mirror.borrow();
        f.debug_struct("CollectionCache")
            .field("entries", &mirror.entries.len())
            .field("epoch", &mirror.epoch)
            .field("stale", &mirror.stale)
            .field("busy", &self.busy.borrow().len())
            .finish_non_exhaustive()
    }
}

struct BusyGuard<'a> {
    busy: &'a RefCell<HashSet<ItemId>>,
    item: ItemId,
}

impl<'a> BusyGuard<'a> {
    fn acquire(busy: &'a RefCell<HashSet<ItemId>>, item: ItemId) -> Option<Self> {
        let inserted = busy.borrow_mut().insert(item);
        inserted.then(|| Self { busy, item })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.borrow_mut().remove(&self.item);
    }
}

impl<T: Transport> CollectionCache<T> {
    /// Empty cache over `api`.
    #[must_use]
    pub fn new(api: Rc<CatalogApi<T>>) -> Self {
        Self {
            api,
            mirror: RefCell::new(Mirror::default()),
            busy: RefCell::new(HashSet::new()),
            issued: Cell::new(0),
            applied: Cell::new(0),
            on_change: RefCell::new(None),
        }
    }

    /// Callback run whenever membership or busy state changes.
    pub fn set_on_change(&self, callback: impl Fn() + 'static) {
        *self.on_change.borrow_mut() = Some(Rc::new(callback));
    }

    /// Whether the mirror holds a current fetch for the current session.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        let mirror = self.mirror.borrow();
        !mirror.stale && mirror.epoch == Some(self.api.credentials().epoch())
    }

    /// Fetch the set unless a current one is already held. Anonymous
    /// sessions fetch nothing.
    ///
    /// # Errors
    /// Any [`ApiError`] from the fetch.
    pub async fn ensure_loaded(&self) -> Result<(), ApiError> {
        if !self.api.credentials().is_authenticated() || self.is_fresh() {
            return Ok(());
        }
        self.refresh().await
    }

    /// Refetch the full set from the server.
    ///
    /// # Errors
    /// Any [`ApiError`] from the fetch; the mirror keeps its previous state.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let ticket = self.issued.get() + 1;
        self.issued.set(ticket);
        let epoch = self.api.credentials().epoch();
        let entries = self.api.collections().await?;
        if ticket <= self.applied.get() {
            tracing::debug!(ticket, "dropping superseded collection fetch");
            return Ok(());
        }
        if epoch != self.api.credentials().epoch() {
            tracing::debug!(ticket, "dropping collection fetch from an ended session");
            return Ok(());
        }
        self.applied.set(ticket);
        *self.mirror.borrow_mut() = Mirror {
            entries,
            epoch: Some(epoch),
            stale: false,
        };
        self.notify();
        Ok(())
    }

    /// Mark the mirror out of date; the next [`Self::ensure_loaded`] refetches.
    /// Fetches already in flight can no longer land.
    pub fn invalidate(&self) {
        self.mirror.borrow_mut().stale = true;
        self.applied.set(self.issued.get());
    }

    /// Forget everything (logout).
    pub fn clear(&self) {
        *self.mirror.borrow_mut() = Mirror::default();
        self.applied.set(self.issued.get());
        self.notify();
    }

    /// Entries of the last fetch for the current session.
    #[must_use]
    pub fn entries(&self) -> Vec<CollectionEntry> {
        self.with_current(<[CollectionEntry]>::to_vec).unwrap_or_default()
    }

    /// Whether `item` is in the signed-in user's collection.
    #[must_use]
    pub fn is_collected(&self, item: ItemId) -> bool {
        self.collection_id_for(item).is_some()
    }

    /// Entry id holding `item`, used for removal.
    #[must_use]
    pub fn collection_id_for(&self, item: ItemId) -> Option<CollectionId> {
        self.with_current(|entries| {
            entries
                .iter()
                .find(|entry| entry.item.id == item)
                .map(|entry| entry.id)
        })
        .flatten()
    }

    /// Whether a toggle for `item` is in flight.
    #[must_use]
    pub fn is_busy(&self, item: ItemId) -> bool {
        self.busy.borrow().contains(&item)
    }

    /// Add `item` if absent, remove it if present.
    ///
    /// # Errors
    /// The mutation's [`ApiError`]; membership is unchanged in that case.
    /// A failed refetch after a successful mutation is logged and the
    /// mutation's outcome is still returned; the mirror stays invalidated
    /// until a later fetch succeeds.
    pub async fn toggle(&self, item: ItemId) -> Result<ToggleOutcome, ApiError> {
        if !self.api.credentials().is_authenticated() {
            tracing::debug!(%item, "toggle without session; redirecting to login");
            self.api.pipeline().redirect_to_login();
            return Ok(ToggleOutcome::LoginRequired);
        }
        let Some(guard) = BusyGuard::acquire(&self.busy, item) else {
            tracing::debug!(%item, "toggle already in flight");
            return Ok(ToggleOutcome::Busy);
        };
        self.notify();
        let outcome = self.mutate(item).await;
        drop(guard);
        self.notify();
        outcome
    }

    async fn mutate(&self, item: ItemId) -> Result<ToggleOutcome, ApiError> {
        self.ensure_loaded().await?;
        let outcome = match self.collection_id_for(item) {
            Some(entry) => {
                self.api.remove_from_collection(entry).await?;
                ToggleOutcome::Removed
            }
            None => {
                self.api.add_to_collection(item).await?;
                ToggleOutcome::Added
            }
        };
        self.invalidate();
        if let Err(err) = self.refresh().await {
            tracing::warn!(error = %err, %item, "collection refetch after mutation failed");
        }
        Ok(outcome)
    }

    fn with_current<R>(&self, read: impl FnOnce(&[CollectionEntry]) -> R) -> Option<R> {
        let credentials = self.api.credentials();
        if !credentials.is_authenticated() {
            return None;
        }
        let mirror = self.mirror.borrow();
        (mirror.epoch == Some(credentials.epoch())).then(|| read(&mirror.entries))
    }

    fn notify(&self) {
        let callback = self.on_change.borrow().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::pipeline::Pipeline;
    use crate::session::CredentialStore;
    use crate::test_support::{ScriptedTransport, collection_page, entry_json, signed_in_store};
    use crate::transport::Method;

    struct Harness {
        transport: Rc<ScriptedTransport>,
        cache: CollectionCache<Rc<ScriptedTransport>>,
        redirects: Rc<Cell<u32>>,
    }

    fn harness(store: Rc<CredentialStore>) -> Harness {
        let transport = Rc::new(ScriptedTransport::new());
        let redirects = Rc::new(Cell::new(0));
        let counter = Rc::clone(&redirects);
        let pipeline = Pipeline::new(
            ClientConfig::new("http://api.test"),
            Rc::clone(&transport),
            store,
        )
        .with_login_redirect(move || counter.set(counter.get() + 1));
        let cache = CollectionCache::new(Rc::new(CatalogApi::new(pipeline)));
        Harness {
            transport,
            cache,
            redirects,
        }
    }

    fn mutations(transport: &ScriptedTransport) -> Vec<(Method, String)> {
        transport
            .requests()
            .into_iter()
            .filter(|request| request.method != Method::Get)
            .map(|request| (request.method, request.url))
            .collect()
    }

    #[tokio::test]
    async fn anonymous_toggle_redirects_without_request() {
        let h = harness(Rc::new(CredentialStore::in_memory()));

        let outcome = h.cache.toggle(ItemId(5)).await.expect("toggle");

        assert_eq!(outcome, ToggleOutcome::LoginRequired);
        assert_eq!(h.redirects.get(), 1);
        assert!(h.transport.requests().is_empty());
        assert!(!h.cache.is_collected(ItemId(5)));
    }

    #[tokio::test]
    async fn toggle_on_collected_item_deletes_matching_entry() {
        let h = harness(signed_in_store("a", "r"));
        h.transport.push(200, &collection_page(&[(7, 42), (8, 43)]));
        h.cache.ensure_loaded().await.expect("load");
        assert!(h.cache.is_collected(ItemId(42)));
        assert_eq!(h.cache.collection_id_for(ItemId(42)), Some(CollectionId(7)));

        h.transport.push(204, "");
        h.transport.push(200, &collection_page(&[(8, 43)]));
        let outcome = h.cache.toggle(ItemId(42)).await.expect("toggle");

        assert_eq!(outcome, ToggleOutcome::Removed);
        assert_eq!(
            mutations(&h.transport),
            vec![(Method::Delete, "http://api.test/collections/7/".to_string())]
        );
        assert!(!h.cache.is_collected(ItemId(42)));
        assert!(h.cache.is_collected(ItemId(43)));
    }

    #[tokio::test]
    async fn add_reflects_the_refetched_set() {
        let h = harness(signed_in_store("a", "r"));
        h.transport.push(200, &collection_page(&[]));
        h.transport.push(201, &entry_json(9, 11));
        h.transport.push(200, &collection_page(&[(9, 11)]));

        let outcome = h.cache.toggle(ItemId(11)).await.expect("toggle");

        assert_eq!(outcome, ToggleOutcome::Added);
        assert!(h.cache.is_collected(ItemId(11)));
        let sent = h.transport.requests();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].method, Method::Get);
        assert!(h.cache.is_fresh());
    }

    #[tokio::test]
    async fn membership_follows_server_not_the_mutation() {
        let h = harness(signed_in_store("a", "r"));
        h.transport.push(200, &collection_page(&[]));
        h.transport.push(201, &entry_json(9, 11));
        // Someone else removed it again before the refetch.
        h.transport.push(200, &collection_page(&[]));

        h.cache.toggle(ItemId(11)).await.expect("toggle");

        assert!(!h.cache.is_collected(ItemId(11)));
    }

    #[tokio::test]
    async fn rapid_double_toggle_sends_one_mutation() {
        let h = harness(signed_in_store("a", "r"));
        h.transport.push(200, &collection_page(&[]));
        h.transport.push(201, &entry_json(1, 5));
        h.transport.push(200, &collection_page(&[(1, 5)]));

        let (first, second) = tokio::join!(h.cache.toggle(ItemId(5)), h.cache.toggle(ItemId(5)));

        assert_eq!(first.expect("first"), ToggleOutcome::Added);
        assert_eq!(second.expect("second"), ToggleOutcome::Busy);
        assert_eq!(mutations(&h.transport).len(), 1);
        assert!(!h.cache.is_busy(ItemId(5)));
    }

    #[tokio::test]
    async fn busy_state_is_visible_while_in_flight() {
        let h = harness(signed_in_store("a", "r"));
        h.transport.push(200, &collection_page(&[]));
        h.transport.push(201, &entry_json(1, 5));
        h.transport.push(200, &collection_page(&[(1, 5)]));

        let toggle = h.cache.toggle(ItemId(5));
        let observe = async {
            tokio::task::yield_now().await;
            h.cache.is_busy(ItemId(5))
        };
        let (outcome, busy_mid_flight) = tokio::join!(toggle, observe);

        assert_eq!(outcome.expect("toggle"), ToggleOutcome::Added);
        assert!(busy_mid_flight);
        assert!(!h.cache.is_busy(ItemId(5)));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_membership_and_clears_busy() {
        let h = harness(signed_in_store("a", "r"));
        h.transport.push(200, &collection_page(&[(7, 42)]));
        h.cache.ensure_loaded().await.expect("load");
        h.transport.push(500, "oops");

        let err = h.cache.toggle(ItemId(42)).await.expect_err("failed");

        assert_eq!(
            err,
            ApiError::Status {
                status: 500,
                message: None
            }
        );
        assert!(h.cache.is_collected(ItemId(42)));
        assert!(!h.cache.is_busy(ItemId(42)));
        assert!(h.cache.is_fresh());
        assert_eq!(h.transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn older_fetch_never_overwrites_newer() {
        let h = harness(signed_in_store("a", "r"));
        h.transport.push_slow(200, &collection_page(&[(1, 100)]), 5);
        h.transport.push(200, &collection_page(&[(2, 200)]));

        let (older, newer) = tokio::join!(h.cache.refresh(), h.cache.refresh());
        older.expect("older");
        newer.expect("newer");

        assert!(h.cache.is_collected(ItemId(200)));
        assert!(!h.cache.is_collected(ItemId(100)));
    }

    #[tokio::test]
    async fn fetch_started_before_a_mutation_cannot_clear_the_invalidation() {
        let h = harness(signed_in_store("a", "r"));
        h.transport.push(200, &collection_page(&[]));
        h.cache.ensure_loaded().await.expect("load");

        // Background refetch still carrying the pre-add set.
        h.transport.push_slow(200, &collection_page(&[]), 8);
        h.transport.push(201, &entry_json(1, 5));
        h.transport.push(500, "refetch failed");
        let (background, outcome) = tokio::join!(h.cache.refresh(), h.cache.toggle(ItemId(5)));
        background.expect("background");

        assert_eq!(outcome.expect("toggle"), ToggleOutcome::Added);
        assert!(!h.cache.is_fresh());

        h.transport.push(200, &collection_page(&[(1, 5)]));
        h.transport.push(204, "");
        h.transport.push(200, &collection_page(&[]));
        let second = h.cache.toggle(ItemId(5)).await.expect("second toggle");

        assert_eq!(second, ToggleOutcome::Removed);
        assert_eq!(
            mutations(&h.transport),
            vec![
                (Method::Post, "http://api.test/collections/".to_string()),
                (Method::Delete, "http://api.test/collections/1/".to_string()),
            ]
        );
        assert!(h.cache.is_fresh());
    }

    #[tokio::test]
    async fn failed_refetch_after_add_leaves_the_mirror_stale_until_reloaded() {
        let h = harness(signed_in_store("a", "r"));
        h.transport.push(200, &collection_page(&[]));
        h.transport.push(201, &entry_json(1, 5));
        h.transport.push(500, "refetch failed");

        let outcome = h.cache.toggle(ItemId(5)).await.expect("toggle");

        assert_eq!(outcome, ToggleOutcome::Added);
        assert!(!h.cache.is_fresh());
        assert!(!h.cache.is_busy(ItemId(5)));

        h.transport.push(200, &collection_page(&[(1, 5)]));
        h.cache.ensure_loaded().await.expect("reload");

        assert!(h.cache.is_fresh());
        assert!(h.cache.is_collected(ItemId(5)));
        let fetches = h
            .transport
            .requests()
            .iter()
            .filter(|request| request.method == Method::Get)
            .count();
        assert_eq!(fetches, 3);
    }

    #[tokio::test]
    async fn mirror_is_dropped_when_the_session_changes() {
        let store = signed_in_store("a", "r");
        let h = harness(Rc::clone(&store));
        h.transport.push(200, &collection_page(&[(7, 42)]));
        h.cache.ensure_loaded().await.expect("load");

        store.logout();
        assert!(!h.cache.is_collected(ItemId(42)));
        assert!(h.cache.entries().is_empty());

        store.establish(comicshelf_api_models::TokenPair {
            access: "b".into(),
            refresh: "s".into(),
        });
        assert!(!h.cache.is_collected(ItemId(42)));
        h.transport.push(200, &collection_page(&[]));
        h.cache.ensure_loaded().await.expect("reload");
        assert_eq!(h.transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn change_callback_fires_on_fetch() {
        let h = harness(signed_in_store("a", "r"));
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        h.cache.set_on_change(move || seen.set(seen.get() + 1));
        h.transport.push(200, &collection_page(&[(1, 2)]));

        h.cache.refresh().await.expect("refresh");

        assert_eq!(calls.get(), 1);
    }
}
