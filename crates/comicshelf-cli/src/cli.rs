//! Argument parsing and command dispatch.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use comicshelf_api_models::{ItemId, SeriesStatus};
use comicshelf_client::SortOrder;
use comicshelf_client::config::{DEFAULT_API_URL, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS};
use comicshelf_telemetry::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, init_logging};
use url::Url;

use crate::client::{AppContext, CliError, CliResult, ClientSettings};
use crate::commands::auth::{handle_login, handle_logout, handle_register, handle_whoami};
use crate::commands::collection::{
    handle_collection_add, handle_collection_list, handle_collection_remove,
    handle_collection_toggle,
};
use crate::commands::items::{handle_item_list, handle_item_show};

/// Parses CLI arguments, executes the requested command, and reports
/// failures on stderr. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format,
        client: "comicshelf-cli",
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err:#}");
    }

    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let settings = ClientSettings {
        api_url: cli.api_url.as_str().trim_end_matches('/').to_string(),
        timeout: Duration::from_secs(cli.timeout),
        session_file: cli.session_file,
    };
    let ctx = AppContext::build(&settings)?;
    tracing::debug!(api_url = %settings.api_url, "catalog client ready");

    match cli.command {
        Command::Login(args) => handle_login(&ctx, args).await,
        Command::Register(args) => handle_register(&ctx, args, cli.output).await,
        Command::Logout => handle_logout(&ctx),
        Command::Whoami => handle_whoami(&ctx, cli.output).await,
        Command::Ls(args) => handle_item_list(&ctx, &args, cli.output).await,
        Command::Show(args) => handle_item_show(&ctx, &args, cli.output).await,
        Command::Collection(collection) => match collection {
            CollectionCommand::List => handle_collection_list(&ctx, cli.output).await,
            CollectionCommand::Add(args) => handle_collection_add(&ctx, &args).await,
            CollectionCommand::Remove(args) => handle_collection_remove(&ctx, &args).await,
            CollectionCommand::Toggle(args) => handle_collection_toggle(&ctx, &args).await,
        },
    }
}

#[derive(Parser)]
#[command(name = "comicshelf", about = "Browse the ComicShelf catalog and manage your collection")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "COMICSHELF_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "COMICSHELF_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long,
        global = true,
        env = "COMICSHELF_SESSION_FILE",
        help = "Where the signed-in session is stored"
    )]
    pub(crate) session_file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "COMICSHELF_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL
    )]
    pub(crate) log_level: String,
    #[arg(
        long,
        global = true,
        env = "COMICSHELF_LOG_FORMAT",
        value_parser = parse_log_format,
        default_value = "pretty"
    )]
    pub(crate) log_format: LogFormat,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Sign in and store the session.
    Login(LoginArgs),
    /// Create an account and sign in with it.
    Register(RegisterArgs),
    /// Forget the stored session.
    Logout,
    /// Show the signed-in account.
    Whoami,
    /// List catalog items.
    Ls(ItemListArgs),
    /// Show one catalog item.
    Show(ItemShowArgs),
    #[command(subcommand)]
    Collection(CollectionCommand),
}

#[derive(Subcommand)]
pub(crate) enum CollectionCommand {
    /// List the items in your collection.
    List,
    /// Add an item to your collection.
    Add(ItemRefArgs),
    /// Remove an item from your collection.
    Remove(ItemRefArgs),
    /// Add the item when missing, remove it when present.
    Toggle(ItemRefArgs),
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long, short)]
    pub(crate) username: String,
    #[arg(long, env = "COMICSHELF_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct RegisterArgs {
    #[arg(long, short)]
    pub(crate) username: String,
    #[arg(long, default_value = "")]
    pub(crate) email: String,
    #[arg(long, env = "COMICSHELF_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct ItemListArgs {
    /// Start from a shared query string such as `status_jp=completed&page=2`.
    #[arg(long)]
    pub(crate) query: Option<String>,
    #[arg(long, short)]
    pub(crate) search: Option<String>,
    #[arg(long, value_parser = parse_status)]
    pub(crate) status: Option<SeriesStatus>,
    #[arg(long)]
    pub(crate) genre: Option<String>,
    #[arg(long)]
    pub(crate) year: Option<i32>,
    #[arg(long, value_parser = parse_sort)]
    pub(crate) ordering: Option<SortOrder>,
    #[arg(long)]
    pub(crate) page: Option<u32>,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub(crate) page_size: u32,
}

#[derive(Args)]
pub(crate) struct ItemShowArgs {
    pub(crate) id: u64,
}

#[derive(Args)]
pub(crate) struct ItemRefArgs {
    /// Catalog item id.
    pub(crate) item: u64,
}

impl ItemRefArgs {
    pub(crate) const fn item_id(&self) -> ItemId {
        ItemId(self.item)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

pub(crate) fn parse_url(value: &str) -> Result<Url, String> {
    Url::parse(value).map_err(|err| format!("invalid URL '{value}': {err}"))
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse()
}

fn parse_status(value: &str) -> Result<SeriesStatus, String> {
    SeriesStatus::parse(value).ok_or_else(|| {
        let allowed: Vec<&str> = SeriesStatus::FILTERABLE
            .iter()
            .map(|status| status.as_str())
            .collect();
        format!("unknown status '{value}' (expected one of: {})", allowed.join(", "))
    })
}

fn parse_sort(value: &str) -> Result<SortOrder, String> {
    SortOrder::parse(value).ok_or_else(|| {
        let allowed: Vec<&str> = SortOrder::ALL.iter().map(|order| order.as_str()).collect();
        format!("unknown ordering '{value}' (expected one of: {})", allowed.join(", "))
    })
}

pub(crate) fn read_password(provided: Option<String>, prompt: &str) -> CliResult<String> {
    if let Some(password) = provided {
        return Ok(password);
    }
    rpassword::prompt_password(prompt)
        .map_err(|err| CliError::failure(anyhow::anyhow!("failed to read password: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ls_flags_parse_into_typed_values() {
        let cli = Cli::try_parse_from([
            "comicshelf",
            "ls",
            "--status",
            "completed",
            "--ordering=-first_published_year",
            "--page",
            "3",
        ])
        .expect("valid arguments");
        let Command::Ls(args) = cli.command else {
            panic!("expected ls command");
        };
        assert_eq!(args.status, Some(SeriesStatus::Completed));
        assert_eq!(args.ordering, Some(SortOrder::YearDesc));
        assert_eq!(args.page, Some(3));
        assert_eq!(args.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Cli::try_parse_from(["comicshelf", "ls", "--status", "cancelled"]).is_err());
    }

    #[test]
    fn global_output_flag_accepts_format_alias() {
        let cli = Cli::try_parse_from(["comicshelf", "whoami", "--format", "json"])
            .expect("valid arguments");
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn collection_subcommands_take_item_ids() {
        let cli = Cli::try_parse_from(["comicshelf", "collection", "toggle", "42"])
            .expect("valid arguments");
        let Command::Collection(CollectionCommand::Toggle(args)) = cli.command else {
            panic!("expected collection toggle");
        };
        assert_eq!(args.item_id(), ItemId(42));
    }
}
