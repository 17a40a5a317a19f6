//! Sign-up form; a successful registration signs the user in.

use comicshelf_client::Registration;
use yew::prelude::*;
use yew_router::prelude::*;
use yewdux::prelude::Dispatch;

use crate::app::{ApiCtx, Route};
use crate::components::{bind_input, use_view_scope};
use crate::core::store::{AppStore, FlashKind, set_flash, set_username};

#[function_component(RegisterPage)]
pub(crate) fn register_page() -> Html {
    let Some(ctx) = use_context::<ApiCtx>() else {
        return html! {};
    };
    let scope = use_view_scope();
    let navigator = use_navigator();
    let username = use_state(String::new);
    let email = use_state(String::new);
    let password = use_state(String::new);
    let confirm = use_state(String::new);
    let error = use_state(|| None as Option<String>);
    let busy = use_state(|| false);

    let on_submit = {
        let fields = (
            username.clone(),
            email.clone(),
            password.clone(),
            confirm.clone(),
        );
        let (error, busy) = (error.clone(), busy.clone());
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            if *busy {
                return;
            }
            let form = Registration {
                username: fields.0.trim().to_string(),
                email: fields.1.trim().to_string(),
                password: (*fields.2).clone(),
                password_confirm: (*fields.3).clone(),
            };
            if let Err(err) = form.validate() {
                error.set(Some(err.user_message()));
                return;
            }
            busy.set(true);
            error.set(None);
            let (ctx, scope, navigator) = (ctx.clone(), scope.clone(), navigator.clone());
            let (error, busy) = (error.clone(), busy.clone());
            yew::platform::spawn_local(async move {
                let result = ctx.api.register_and_login(&form).await;
                ctx.sync_session();
                if let Ok(user) = &result {
                    let epoch = ctx.api.credentials().epoch();
                    let name = user.username.clone();
                    Dispatch::<AppStore>::new().reduce_mut(|store| {
                        set_username(store, epoch, name);
                        set_flash(store, FlashKind::Success, "Welcome to ComicShelf!");
                    });
                }
                if !scope.is_active() {
                    return;
                }
                busy.set(false);
                match result {
                    Ok(_) => {
                        if let Some(navigator) = navigator {
                            navigator.push(&Route::Items);
                        }
                    }
                    Err(err) => error.set(Some(err.user_message())),
                }
            });
        })
    };

    html! {
        <section class="card auth-form">
            <h2>{"Create an account"}</h2>
            <form onsubmit={on_submit}>
                <label class="stack">
                    <span>{"Username"}</span>
                    <input value={(*username).clone()} oninput={bind_input(&username)} autocomplete="username" />
                </label>
                <label class="stack">
                    <span>{"Email (optional)"}</span>
                    <input type="email" value={(*email).clone()} oninput={bind_input(&email)} autocomplete="email" />
                </label>
                <label class="stack">
                    <span>{"Password"}</span>
                    <input type="password" value={(*password).clone()} oninput={bind_input(&password)} autocomplete="new-password" />
                </label>
                <label class="stack">
                    <span>{"Confirm password"}</span>
                    <input type="password" value={(*confirm).clone()} oninput={bind_input(&confirm)} autocomplete="new-password" />
                </label>
                {if let Some(err) = &*error {
                    html! { <p class="error-text">{err}</p> }
                } else { html! {} }}
                <button class="solid" type="submit" disabled={*busy}>{"Register"}</button>
            </form>
            <p class="muted">
                {"Already registered? "}
                <Link<Route> to={Route::Login}>{"Sign in"}</Link<Route>>
            </p>
        </section>
    }
}
