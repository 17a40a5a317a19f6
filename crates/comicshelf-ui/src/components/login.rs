//! Sign-in form.

use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::{ApiCtx, Route};
use crate::components::{bind_input, use_view_scope};

#[function_component(LoginPage)]
pub(crate) fn login_page() -> Html {
    let Some(ctx) = use_context::<ApiCtx>() else {
        return html! {};
    };
    let scope = use_view_scope();
    let navigator = use_navigator();
    let username = use_state(String::new);
    let password = use_state(String::new);
    let error = use_state(|| None as Option<String>);
    let busy = use_state(|| false);

    let on_submit = {
        let (username, password, error, busy) =
            (username.clone(), password.clone(), error.clone(), busy.clone());
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            if *busy {
                return;
            }
            let name = username.trim().to_string();
            if name.is_empty() || password.is_empty() {
                error.set(Some("Enter your username and password.".to_string()));
                return;
            }
            busy.set(true);
            error.set(None);
            let (ctx, scope, navigator) = (ctx.clone(), scope.clone(), navigator.clone());
            let (secret, error, busy) = ((*password).clone(), error.clone(), busy.clone());
            yew::platform::spawn_local(async move {
                let result = ctx.api.login(&name, &secret).await;
                ctx.sync_session();
                if !scope.is_active() {
                    return;
                }
                busy.set(false);
                match result {
                    Ok(()) => {
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
            <h2>{"Sign in"}</h2>
            <form onsubmit={on_submit}>
                <label class="stack">
                    <span>{"Username"}</span>
                    <input value={(*username).clone()} oninput={bind_input(&username)} autocomplete="username" />
                </label>
                <label class="stack">
                    <span>{"Password"}</span>
                    <input type="password" value={(*password).clone()} oninput={bind_input(&password)} autocomplete="current-password" />
                </label>
                {if let Some(err) = &*error {
                    html! { <p class="error-text">{err}</p> }
                } else { html! {} }}
                <button class="solid" type="submit" disabled={*busy}>{"Sign in"}</button>
            </form>
            <p class="muted">
                {"No account yet? "}
                <Link<Route> to={Route::Register}>{"Register"}</Link<Route>>
            </p>
        </section>
    }
}
