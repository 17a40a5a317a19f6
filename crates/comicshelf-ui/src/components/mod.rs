//! Page and widget components.

use comicshelf_client::ViewScope;
use gloo::console;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;
use yewdux::prelude::use_selector;

use crate::app::ApiCtx;
use crate::core::store::AppStore;

pub(crate) mod collect_button;
pub(crate) mod collections;
pub(crate) mod detail;
pub(crate) mod items;
pub(crate) mod login;
pub(crate) mod nav;
pub(crate) mod register;

/// Scope closed when the calling component unmounts.
#[hook]
pub(crate) fn use_view_scope() -> ViewScope {
    let scope = use_memo(|_| ViewScope::new(), ());
    {
        let scope = (*scope).clone();
        use_effect_with_deps(move |_| move || scope.close(), ());
    }
    (*scope).clone()
}

/// Keep the collection cache loaded for views that show collect buttons.
///
/// Runs on sign-in and on every cache change, so a mirror left stale by a
/// failed refetch is reloaded; `ensure_loaded` is a no-op while it is fresh.
#[hook]
pub(crate) fn use_collection_sync() {
    let ctx = use_context::<ApiCtx>();
    let watched = use_selector(|store: &AppStore| {
        (
            store.session.authenticated,
            store.session.epoch,
            store.collection_revision,
        )
    });
    use_effect_with_deps(
        move |(authenticated, _epoch, _revision): &(bool, u64, u64)| {
            if let (true, Some(ctx)) = (*authenticated, ctx) {
                yew::platform::spawn_local(async move {
                    if let Err(err) = ctx.collections.ensure_loaded().await {
                        console::warn!(format!("collection load failed: {err}"));
                    }
                });
            }
            || ()
        },
        *watched,
    );
}

/// Mirror an `<input>` into a string state.
pub(crate) fn bind_input(state: &UseStateHandle<String>) -> Callback<InputEvent> {
    let state = state.clone();
    Callback::from(move |event: InputEvent| {
        if let Some(input) = event.target_dyn_into::<HtmlInputElement>() {
            state.set(input.value());
        }
    })
}

/// Current value of the `<select>` that fired `event`.
pub(crate) fn select_value(event: &Event) -> Option<String> {
    event
        .target_dyn_into::<HtmlSelectElement>()
        .map(|select| select.value())
}
