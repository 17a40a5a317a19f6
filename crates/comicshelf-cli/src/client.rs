//! Shared client wiring and error types for the CLI.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::anyhow;
use comicshelf_client::{
    ApiError, CatalogApi, ClientConfig, CredentialStore, Pipeline, ReqwestTransport,
};

use crate::session_file::{FileTokenStorage, default_session_path};

/// Hint printed whenever the stored session can no longer be used.
pub(crate) const LOGIN_HINT: &str = "session expired; run `comicshelf login` to sign in again";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::AuthExpired => Self::validation(LOGIN_HINT),
            ApiError::Unauthorized { message } => Self::validation(message.map_or_else(
                || "not signed in; run `comicshelf login` first".to_string(),
                |message| format!("{message} (run `comicshelf login` to sign in)"),
            )),
            err @ (ApiError::InvalidInput(_)
            | ApiError::Validation { .. }
            | ApiError::NotFound { .. }) => Self::validation(err.user_message()),
            other => Self::failure(anyhow!(other.user_message())),
        }
    }
}

/// Settings resolved from flags and environment.
#[derive(Debug, Clone)]
pub(crate) struct ClientSettings {
    pub(crate) api_url: String,
    pub(crate) timeout: Duration,
    pub(crate) session_file: Option<PathBuf>,
}

/// Everything command handlers need to talk to the catalog.
pub(crate) struct AppContext {
    pub(crate) api: Rc<CatalogApi<ReqwestTransport>>,
}

impl AppContext {
    /// Build the HTTP stack and rehydrate the stored session.
    pub(crate) fn build(settings: &ClientSettings) -> CliResult<Self> {
        let path = settings
            .session_file
            .clone()
            .or_else(default_session_path)
            .ok_or_else(|| {
                CliError::validation(
                    "no config directory available; pass --session-file or set COMICSHELF_SESSION_FILE",
                )
            })?;
        let storage = FileTokenStorage::new(path);
        tracing::debug!(path = %storage.path().display(), "using session file");
        let credentials = Rc::new(CredentialStore::new(storage));
        Self::with_credentials(settings, credentials)
    }

    pub(crate) fn with_credentials(
        settings: &ClientSettings,
        credentials: Rc<CredentialStore>,
    ) -> CliResult<Self> {
        let config = ClientConfig::new(settings.api_url.clone()).with_timeout(settings.timeout);
        let transport = ReqwestTransport::new(&config)
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;
        let pipeline = Pipeline::new(config, transport, credentials)
            .with_login_redirect(|| eprintln!("{LOGIN_HINT}"));
        Ok(Self {
            api: Rc::new(CatalogApi::new(pipeline)),
        })
    }

    pub(crate) fn require_login(&self) -> CliResult<()> {
        if self.api.credentials().is_authenticated() {
            Ok(())
        } else {
            Err(CliError::validation(
                "not signed in; run `comicshelf login` first",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use comicshelf_client::TransportError;

    use super::*;

    #[test]
    fn api_errors_map_to_exit_codes() {
        let expired = CliError::from(ApiError::AuthExpired);
        assert_eq!(expired.exit_code(), 2);
        assert_eq!(expired.display_message(), LOGIN_HINT);

        let validation = CliError::from(ApiError::Validation {
            status: 400,
            message: "already in your collection".to_string(),
            fields: BTreeMap::new(),
        });
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.display_message(), "already in your collection");

        let network = CliError::from(ApiError::Network(TransportError::Timeout));
        assert_eq!(network.exit_code(), 3);
    }

    #[test]
    fn unauthorized_message_carries_login_hint() {
        let err = CliError::from(ApiError::Unauthorized {
            message: Some("No active account found with the given credentials".to_string()),
        });
        assert!(err.display_message().contains("comicshelf login"));
        assert!(err.display_message().starts_with("No active account"));
    }
}
