//! Application shell: context, router, and page switch.

use gloo::utils::window;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::components::collections::CollectionsPage;
use crate::components::detail::ItemDetailPage;
use crate::components::items::ItemListPage;
use crate::components::login::LoginPage;
use crate::components::nav::{FlashBanner, NavBar};
use crate::components::register::RegisterPage;
use crate::core::location::api_base_from_origin;

pub(crate) mod api;
mod routes;

pub(crate) use api::ApiCtx;
pub(crate) use routes::Route;

fn api_base_url() -> String {
    let origin = window().location().origin().unwrap_or_default();
    api_base_from_origin(&origin)
}

#[function_component(ComicShelfApp)]
fn comicshelf_app() -> Html {
    let api_ctx = use_memo(|_| ApiCtx::new(api_base_url()), ());

    html! {
        <ContextProvider<ApiCtx> context={(*api_ctx).clone()}>
            <BrowserRouter>
                <RouterBridge />
                <NavBar />
                <FlashBanner />
                <main class="container">
                    <Switch<Route> render={switch} />
                </main>
            </BrowserRouter>
        </ContextProvider<ApiCtx>>
    }
}

/// Hands the router's navigator to the login redirect and mirrors the
/// persisted session into the store on boot.
#[function_component(RouterBridge)]
fn router_bridge() -> Html {
    let api_ctx = use_context::<ApiCtx>();
    let navigator = use_navigator();
    use_effect_with_deps(
        move |_| {
            if let Some(ctx) = api_ctx {
                if let Some(navigator) = navigator {
                    ctx.install_navigator(navigator);
                }
                ctx.sync_session();
            }
            || ()
        },
        (),
    );
    html! {}
}

fn switch(route: Route) -> Html {
    match route {
        Route::Home => html! { <Redirect<Route> to={Route::Items} /> },
        Route::Items => html! { <ItemListPage /> },
        Route::ItemDetail { id } => html! { <ItemDetailPage {id} /> },
        Route::Collections => html! { <CollectionsPage /> },
        Route::Login => html! { <LoginPage /> },
        Route::Register => html! { <RegisterPage /> },
        Route::NotFound => html! {
            <section class="empty-state">
                <h2>{"Page not found"}</h2>
                <Link<Route> to={Route::Items}>{"Back to the catalog"}</Link<Route>>
            </section>
        },
    }
}

/// Mount the app on `#root`, or on `<body>` when the element is missing.
pub fn run_app() {
    console_error_panic_hook::set_once();
    if let Some(root) = gloo::utils::document().get_element_by_id("root") {
        yew::Renderer::<ComicShelfApp>::with_root(root).render();
    } else {
        yew::Renderer::<ComicShelfApp>::new().render();
    }
}
