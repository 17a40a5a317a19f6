//! Top bar with search shortcut, session menu, and the flash banner.

use comicshelf_client::search_location;
use gloo::console;
use yew::prelude::*;
use yew_router::prelude::*;
use yewdux::prelude::{Dispatch, use_selector};

use crate::app::{ApiCtx, Route};
use crate::components::bind_input;
use crate::core::location::{query_pairs, split_location};
use crate::core::store::{AppStore, FlashKind, clear_flash, set_username};

#[function_component(NavBar)]
pub(crate) fn nav_bar() -> Html {
    let Some(ctx) = use_context::<ApiCtx>() else {
        return html! {};
    };
    let navigator = use_navigator();
    let session = use_selector(|store: &AppStore| store.session.clone());
    let search = use_state(String::new);

    {
        let api = ctx.api.clone();
        use_effect_with_deps(
            move |(authenticated, epoch, has_name): &(bool, u64, bool)| {
                if *authenticated && !*has_name {
                    let epoch = *epoch;
                    yew::platform::spawn_local(async move {
                        match api.current_user().await {
                            Ok(user) => Dispatch::<AppStore>::new()
                                .reduce_mut(|store| set_username(store, epoch, user.username)),
                            Err(err) => console::warn!(format!("profile lookup failed: {err}")),
                        }
                    });
                }
                || ()
            },
            (
                session.authenticated,
                session.epoch,
                session.username.is_some(),
            ),
        );
    }

    let on_search = {
        let search = search.clone();
        let navigator = navigator.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            let (Some(location), Some(navigator)) = (search_location(&search), navigator.as_ref())
            else {
                return;
            };
            let (_, query) = split_location(&location);
            if let Err(err) = navigator.push_with_query(&Route::Items, &query_pairs(query)) {
                console::error!(format!("navigation failed: {err:?}"));
            }
        })
    };

    let on_logout = {
        let ctx = ctx.clone();
        let navigator = navigator.clone();
        Callback::from(move |_| {
            ctx.api.logout();
            ctx.collections.clear();
            ctx.sync_session();
            if let Some(navigator) = &navigator {
                navigator.push(&Route::Items);
            }
        })
    };

    html! {
        <nav class="navbar">
            <Link<Route> classes="brand" to={Route::Items}>{"ComicShelf"}</Link<Route>>
            <form class="search" onsubmit={on_search}>
                <input
                    type="search"
                    placeholder="Search titles"
                    value={(*search).clone()}
                    oninput={bind_input(&search)}
                />
            </form>
            <div class="session">
                {if session.authenticated {
                    html! {
                        <>
                            <Link<Route> to={Route::Collections}>{"My collection"}</Link<Route>>
                            <span class="muted">
                                {session.username.clone().unwrap_or_default()}
                            </span>
                            <button class="ghost" onclick={on_logout}>{"Sign out"}</button>
                        </>
                    }
                } else {
                    html! {
                        <>
                            <Link<Route> to={Route::Login}>{"Sign in"}</Link<Route>>
                            <Link<Route> to={Route::Register}>{"Register"}</Link<Route>>
                        </>
                    }
                }}
            </div>
        </nav>
    }
}

#[function_component(FlashBanner)]
pub(crate) fn flash_banner() -> Html {
    let flash = use_selector(|store: &AppStore| store.flash.clone());
    let Some(flash) = (*flash).clone() else {
        return html! {};
    };
    let class = match flash.kind {
        FlashKind::Success => "flash success",
        FlashKind::Error => "flash error",
    };
    let dismiss = Callback::from(|_| Dispatch::<AppStore>::new().reduce_mut(clear_flash));
    html! {
        <div class={class} role="status">
            <span>{flash.message}</span>
            <button class="ghost" onclick={dismiss}>{"×"}</button>
        </div>
    }
}
