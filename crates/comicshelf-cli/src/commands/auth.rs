use comicshelf_client::Registration;

use crate::cli::{LoginArgs, OutputFormat, RegisterArgs, read_password};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_user;

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    let username = args.username.trim();
    if username.is_empty() {
        return Err(CliError::validation("username must not be empty"));
    }
    let password = read_password(args.password, "Password: ")?;
    ctx.api.login(username, &password).await?;
    println!("signed in as {username}");
    Ok(())
}

pub(crate) async fn handle_register(
    ctx: &AppContext,
    args: RegisterArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let (password, password_confirm) = match args.password {
        Some(password) => (password.clone(), password),
        None => (
            read_password(None, "Password: ")?,
            read_password(None, "Confirm password: ")?,
        ),
    };
    let form = Registration {
        username: args.username.trim().to_string(),
        email: args.email.trim().to_string(),
        password,
        password_confirm,
    };
    let user = ctx.api.register_and_login(&form).await?;
    render_user(&user, format)
}

pub(crate) fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    ctx.api.logout();
    println!("signed out");
    Ok(())
}

pub(crate) async fn handle_whoami(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    ctx.require_login()?;
    let user = ctx.api.current_user().await?;
    render_user(&user, format)
}
