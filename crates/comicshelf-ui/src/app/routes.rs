//! Routing definitions for the ComicShelf UI.
use yew_router::prelude::*;

#[derive(Clone, Routable, PartialEq, Eq, Debug)]
pub(crate) enum Route {
    #[at("/")]
    Home,
    #[at("/items")]
    Items,
    #[at("/items/:id")]
    ItemDetail { id: u64 },
    #[at("/collections")]
    Collections,
    #[at("/login")]
    Login,
    #[at("/register")]
    Register,
    #[not_found]
    #[at("/404")]
    NotFound,
}
