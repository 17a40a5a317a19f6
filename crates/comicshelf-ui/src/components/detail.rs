//! Single item page.

use comicshelf_api_models::{Item, ItemId};
use comicshelf_client::ApiError;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::{ApiCtx, Route};
use crate::components::collect_button::CollectButton;
use crate::components::{use_collection_sync, use_view_scope};

#[derive(Properties, PartialEq)]
pub(crate) struct ItemDetailProps {
    pub id: u64,
}

#[derive(Clone, PartialEq)]
enum DetailState {
    Loading,
    Loaded(Box<Item>),
    Missing,
    Failed(String),
}

#[function_component(ItemDetailPage)]
pub(crate) fn item_detail_page(props: &ItemDetailProps) -> Html {
    let Some(ctx) = use_context::<ApiCtx>() else {
        return html! {};
    };
    let scope = use_view_scope();
    let state = use_state(|| DetailState::Loading);
    use_collection_sync();

    {
        let (api, state) = (ctx.api.clone(), state.clone());
        use_effect_with_deps(
            move |id: &u64| {
                let id = ItemId(*id);
                state.set(DetailState::Loading);
                yew::platform::spawn_local(async move {
                    let result = api.get_item(id).await;
                    let Some(result) = scope.deliver(result) else {
                        return;
                    };
                    state.set(match result {
                        Ok(item) => DetailState::Loaded(Box::new(item)),
                        Err(ApiError::NotFound { .. }) => DetailState::Missing,
                        Err(err) => DetailState::Failed(err.user_message()),
                    });
                });
                || ()
            },
            props.id,
        );
    }

    let body = match &*state {
        DetailState::Loading => html! { <p class="muted">{"Loading…"}</p> },
        DetailState::Missing => html! { <p class="muted">{"This item does not exist."}</p> },
        DetailState::Failed(message) => html! { <p class="error-text">{message}</p> },
        DetailState::Loaded(item) => render_item(item),
    };
    html! {
        <section class="item-detail">
            <Link<Route> to={Route::Items}>{"← Back to the catalog"}</Link<Route>>
            {body}
        </section>
    }
}

fn render_item(item: &Item) -> Html {
    html! {
        <article class="card">
            <header>
                <h2>{item.display_title()}</h2>
                <p class="muted">{&item.title_jp}</p>
                <CollectButton item={item.id} />
            </header>
            <dl>
                if !item.author.is_empty() {
                    <dt>{"Author"}</dt><dd>{&item.author}</dd>
                }
                <dt>{"Status"}</dt><dd>{item.status.label()}</dd>
                if !item.genres.is_empty() {
                    <dt>{"Genres"}</dt><dd>{item.genres.join(", ")}</dd>
                }
                if let Some(year) = item.first_published_year {
                    <dt>{"First published"}</dt><dd>{year.to_string()}</dd>
                }
                if let Some(latest) = item.latest_volume_jp_number {
                    <dt>{"Latest volume (JP)"}</dt><dd>{latest.to_string()}</dd>
                }
                if let Some(latest) = item.latest_volume_tw_number {
                    <dt>{"Latest volume (TW)"}</dt><dd>{latest.to_string()}</dd>
                }
            </dl>
            if !item.volumes.is_empty() {
                <table class="volumes">
                    <thead>
                        <tr><th>{"Vol."}</th><th>{"Region"}</th><th>{"Released"}</th><th>{"Publisher"}</th></tr>
                    </thead>
                    <tbody>
                        {for item.volumes.iter().map(|volume| html! {
                            <tr key={volume.id}>
                                <td>{volume.volume_number.map_or_else(|| "-".to_string(), |n| n.to_string())}</td>
                                <td>{format!("{:?}", volume.region)}</td>
                                <td>{volume.release_date.map_or_else(|| "-".to_string(), |date| date.to_string())}</td>
                                <td>{volume.publisher_name.clone().unwrap_or_default()}</td>
                            </tr>
                        })}
                    </tbody>
                </table>
            }
        </article>
    }
}
