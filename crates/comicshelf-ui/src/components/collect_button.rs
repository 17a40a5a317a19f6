//! Add/remove toggle for one catalog item.

use comicshelf_api_models::ItemId;
use comicshelf_client::ToggleOutcome;
use yew::prelude::*;
use yewdux::prelude::{Dispatch, use_selector};

use crate::app::ApiCtx;
use crate::core::store::{AppStore, FlashKind, set_flash};

#[derive(Properties, PartialEq)]
pub(crate) struct CollectButtonProps {
    pub item: ItemId,
}

#[function_component(CollectButton)]
pub(crate) fn collect_button(props: &CollectButtonProps) -> Html {
    let Some(ctx) = use_context::<ApiCtx>() else {
        return html! {};
    };
    // Re-render whenever the cache reports a change.
    let _revision = use_selector(|store: &AppStore| store.collection_revision);
    let item = props.item;
    let collected = ctx.collections.is_collected(item);
    let busy = ctx.collections.is_busy(item);

    // The toggle is not tied to this view: it finishes and invalidates the
    // cache even if the button unmounts first.
    let onclick = {
        let collections = ctx.collections.clone();
        Callback::from(move |_| {
            let collections = collections.clone();
            yew::platform::spawn_local(async move {
                let message = match collections.toggle(item).await {
                    Ok(ToggleOutcome::Added) => Some((FlashKind::Success, "Added to your collection.".to_string())),
                    Ok(ToggleOutcome::Removed) => Some((FlashKind::Success, "Removed from your collection.".to_string())),
                    Ok(ToggleOutcome::Busy | ToggleOutcome::LoginRequired) => None,
                    Err(err) if err.requires_login() => None,
                    Err(err) => Some((FlashKind::Error, err.user_message())),
                };
                if let Some((kind, message)) = message {
                    Dispatch::<AppStore>::new().reduce_mut(|store| set_flash(store, kind, message));
                }
            });
        })
    };

    let (label, class) = if collected {
        ("In collection", "solid collected")
    } else {
        ("Add to collection", "ghost")
    };
    html! {
        <button class={class} {onclick} disabled={busy} aria-pressed={collected.to_string()}>
            {if busy { "Saving…" } else { label }}
        </button>
    }
}
