//! The signed-in user's collection.

use gloo::console;
use yew::prelude::*;
use yew_router::prelude::*;
use yewdux::prelude::use_selector;

use crate::app::{ApiCtx, Route};
use crate::components::collect_button::CollectButton;
use crate::components::use_view_scope;
use crate::core::store::AppStore;

#[function_component(CollectionsPage)]
pub(crate) fn collections_page() -> Html {
    let Some(ctx) = use_context::<ApiCtx>() else {
        return html! {};
    };
    let scope = use_view_scope();
    let session = use_selector(|store: &AppStore| (store.session.authenticated, store.session.epoch));
    let revision = use_selector(|store: &AppStore| store.collection_revision);
    let error = use_state(|| None as Option<String>);

    {
        let collections = ctx.collections.clone();
        let error = error.clone();
        use_effect_with_deps(
            // Also rerun on cache changes so a mirror left stale by a failed
            // refetch is loaded again.
            move |(authenticated, _epoch, _revision): &(bool, u64, u64)| {
                if *authenticated {
                    yew::platform::spawn_local(async move {
                        let result = collections.ensure_loaded().await;
                        let Some(result) = scope.deliver(result) else {
                            return;
                        };
                        match result {
                            Ok(()) => error.set(None),
                            Err(err) if err.requires_login() => {}
                            Err(err) => {
                                console::warn!(format!("collection load failed: {err}"));
                                error.set(Some(err.user_message()));
                            }
                        }
                    });
                }
                || ()
            },
            (session.0, session.1, *revision),
        );
    }

    if !session.0 {
        return html! {
            <section class="empty-state">
                <p>{"Sign in to see your collection."}</p>
                <Link<Route> to={Route::Login}>{"Sign in"}</Link<Route>>
            </section>
        };
    }

    let entries = ctx.collections.entries();
    let body = if let Some(message) = &*error {
        html! { <p class="error-text">{message}</p> }
    } else if !ctx.collections.is_fresh() && entries.is_empty() {
        html! { <p class="muted">{"Loading…"}</p> }
    } else if entries.is_empty() {
        html! { <p class="muted">{"Your collection is empty."}</p> }
    } else {
        html! {
            <ul class="item-list">
                {for entries.iter().map(|entry| html! {
                    <li key={entry.id.0} class="item-row">
                        <Link<Route> to={Route::ItemDetail { id: entry.item.id.0 }}>
                            {entry.item.display_title()}
                        </Link<Route>>
                        <span class="muted">
                            {format!("added {}", entry.added_at.format("%Y-%m-%d"))}
                        </span>
                        <CollectButton item={entry.item.id} />
                    </li>
                })}
            </ul>
        }
    };

    html! {
        <section class="collections">
            <h2>{"My collection"}</h2>
            {body}
        </section>
    }
}
