//! Catalog listing with filters kept in step with the address bar.

use comicshelf_api_models::{Item, Page, SeriesStatus, total_pages};
use comicshelf_client::{FilterChange, FilterState, FilterUrlSync, SortOrder, UrlContract};
use gloo::console;
use yew::prelude::*;
use yew_router::prelude::*;
use yewdux::prelude::use_selector;

use crate::app::{ApiCtx, Route};
use crate::components::collect_button::CollectButton;
use crate::components::{bind_input, select_value, use_collection_sync, use_view_scope};
use crate::core::location::{page_window, query_pairs};
use crate::core::store::AppStore;

fn replace_query(navigator: &Navigator, query: &str) {
    if query.is_empty() {
        navigator.replace(&Route::Items);
    } else if let Err(err) = navigator.replace_with_query(&Route::Items, &query_pairs(query)) {
        console::error!(format!("failed to update the address bar: {err:?}"));
    }
}

#[function_component(ItemListPage)]
pub(crate) fn item_list_page() -> Html {
    let Some(ctx) = use_context::<ApiCtx>() else {
        return html! {};
    };
    let scope = use_view_scope();
    let navigator = use_navigator();
    let query = use_location()
        .map(|location| location.query_str().to_string())
        .unwrap_or_default();
    let sync = {
        let query = query.clone();
        use_mut_ref(move || FilterUrlSync::new(UrlContract::FILTERS_ONLY, &query))
    };
    let filters = {
        let sync = sync.clone();
        use_state(move || sync.borrow().state().clone())
    };
    let results = use_state(|| None as Option<Page<Item>>);
    let error = use_state(|| None as Option<String>);
    let loading = use_state(|| true);
    let latest_fetch = use_mut_ref(|| 0_u64);
    let session = use_selector(|store: &AppStore| (store.session.authenticated, store.session.epoch));

    // Address bar -> state (links, back/forward, the echo of our own write).
    {
        let (sync, filters) = (sync.clone(), filters.clone());
        use_effect_with_deps(
            move |query: &String| {
                let changed = sync.borrow_mut().on_navigation(query);
                if changed {
                    filters.set(sync.borrow().state().clone());
                }
                || ()
            },
            query,
        );
    }

    // State -> list request; only the newest request may land.
    {
        let api = ctx.api.clone();
        let (results, error, loading) = (results.clone(), error.clone(), loading.clone());
        let scope = scope.clone();
        use_effect_with_deps(
            move |(state, _epoch): &(FilterState, u64)| {
                let ticket = {
                    let mut latest = latest_fetch.borrow_mut();
                    *latest += 1;
                    *latest
                };
                loading.set(true);
                let params = state.to_list_params(api.config().page_size);
                yew::platform::spawn_local(async move {
                    let result = api.list_items(&params).await;
                    if !scope.is_active() || *latest_fetch.borrow() != ticket {
                        return;
                    }
                    loading.set(false);
                    match result {
                        Ok(page) => {
                            results.set(Some(page));
                            error.set(None);
                        }
                        Err(err) => error.set(Some(err.user_message())),
                    }
                });
                || ()
            },
            ((*filters).clone(), session.1),
        );
    }

    use_collection_sync();

    let on_change = {
        let (sync, filters) = (sync, filters.clone());
        Callback::from(move |change: FilterChange| {
            let write = sync.borrow_mut().on_user_change(change);
            filters.set(sync.borrow().state().clone());
            if let (Some(query), Some(navigator)) = (write, navigator.as_ref()) {
                replace_query(navigator, &query);
            }
        })
    };

    let page_size = ctx.api.config().page_size;
    let body = match (&*results, &*error) {
        (_, Some(message)) => html! { <p class="error-text">{message}</p> },
        (None, None) => html! { <p class="muted">{"Loading…"}</p> },
        (Some(page), None) if page.results.is_empty() => {
            html! { <p class="muted">{"No items match these filters."}</p> }
        }
        (Some(page), None) => html! {
            <>
                <ul class="item-list">
                    {for page.results.iter().map(render_row)}
                </ul>
                <Pager
                    current={filters.page}
                    total={total_pages(page.count, page_size)}
                    has_prev={page.has_prev()}
                    has_next={page.has_next()}
                    on_change={on_change.clone()}
                />
            </>
        },
    };

    html! {
        <section class="items">
            <FilterBar state={(*filters).clone()} on_change={on_change} />
            if *loading && results.is_some() {
                <p class="muted">{"Refreshing…"}</p>
            }
            {body}
        </section>
    }
}

fn render_row(item: &Item) -> Html {
    html! {
        <li key={item.id.0} class="item-row">
            <Link<Route> to={Route::ItemDetail { id: item.id.0 }}>{item.display_title()}</Link<Route>>
            <span class="badge">{item.status.label()}</span>
            if let Some(year) = item.first_published_year {
                <span class="muted">{year.to_string()}</span>
            }
            <CollectButton item={item.id} />
        </li>
    }
}

#[derive(Properties, PartialEq)]
struct FilterBarProps {
    state: FilterState,
    on_change: Callback<FilterChange>,
}

#[function_component(FilterBar)]
fn filter_bar(props: &FilterBarProps) -> Html {
    let search = use_state(|| props.state.search.clone());
    let genre = use_state(|| props.state.genre.clone());
    let year = use_state(|| props.state.year.map(|year| year.to_string()).unwrap_or_default());

    // Follow external changes (back/forward, search shortcut).
    {
        let (search, genre, year) = (search.clone(), genre.clone(), year.clone());
        use_effect_with_deps(
            move |state: &FilterState| {
                search.set(state.search.clone());
                genre.set(state.genre.clone());
                year.set(state.year.map(|year| year.to_string()).unwrap_or_default());
                || ()
            },
            props.state.clone(),
        );
    }

    let on_submit = {
        let (search, genre, year) = (search.clone(), genre.clone(), year.clone());
        let on_change = props.on_change.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            on_change.emit(FilterChange::Form {
                search: search.trim().to_string(),
                genre: genre.trim().to_string(),
                year: year.trim().parse::<i32>().ok(),
            });
        })
    };

    let on_status = {
        let on_change = props.on_change.clone();
        Callback::from(move |event: Event| {
            if let Some(value) = select_value(&event) {
                on_change.emit(FilterChange::Status(SeriesStatus::parse(&value)));
            }
        })
    };

    let on_sort = {
        let on_change = props.on_change.clone();
        Callback::from(move |event: Event| {
            if let Some(order) = select_value(&event).and_then(|value| SortOrder::parse(&value)) {
                on_change.emit(FilterChange::Sort(order));
            }
        })
    };

    let on_reset = {
        let on_change = props.on_change.clone();
        Callback::from(move |_| on_change.emit(FilterChange::Reset))
    };

    let status = props.state.status;
    let ordering = props.state.ordering;
    html! {
        <form class="filter-bar" onsubmit={on_submit}>
            <input type="search" placeholder="Search" value={(*search).clone()} oninput={bind_input(&search)} />
            <select onchange={on_status}>
                <option value="" selected={status.is_none()}>{"Any status"}</option>
                {for SeriesStatus::FILTERABLE.iter().map(|option| html! {
                    <option value={option.as_str()} selected={status == Some(*option)}>{option.label()}</option>
                })}
            </select>
            <input placeholder="Genre" value={(*genre).clone()} oninput={bind_input(&genre)} />
            <input type="number" placeholder="Year" value={(*year).clone()} oninput={bind_input(&year)} />
            <select onchange={on_sort}>
                {for SortOrder::ALL.iter().map(|option| html! {
                    <option value={option.as_str()} selected={ordering == *option}>{option.label()}</option>
                })}
            </select>
            <button class="solid" type="submit">{"Apply"}</button>
            if props.state.has_filters() {
                <button class="ghost" type="button" onclick={on_reset}>{"Clear filters"}</button>
            }
        </form>
    }
}

#[derive(Properties, PartialEq)]
struct PagerProps {
    current: u32,
    total: u64,
    has_prev: bool,
    has_next: bool,
    on_change: Callback<FilterChange>,
}

#[function_component(Pager)]
fn pager(props: &PagerProps) -> Html {
    let go = |page: u32| {
        let on_change = props.on_change.clone();
        Callback::from(move |_| on_change.emit(FilterChange::Page(page)))
    };
    let current = props.current;
    html! {
        <nav class="pager">
            <button class="ghost" disabled={!props.has_prev} onclick={go(current.saturating_sub(1).max(1))}>{"Previous"}</button>
            {for page_window(current, props.total, 2).into_iter().map(|page| html! {
                <button
                    key={page}
                    class={if page == current { "solid" } else { "ghost" }}
                    onclick={go(page)}
                >
                    {page.to_string()}
                </button>
            })}
            <button class="ghost" disabled={!props.has_next} onclick={go(current + 1)}>{"Next"}</button>
        </nav>
    }
}
