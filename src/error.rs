use std::time::Duration;

use thiserror::Error;

/// Failure reported by a [`Provider`](crate::provider::Provider) call.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("GitHub returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Raised by the in-memory provider when a command is wired to the wrong repository.
    #[error("unexpected repository {0}")]
    WrongRepository(String),

    #[error(transparent)]
    Client(Box<octocrab::Error>),
}

impl ForgeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::NotFound(_))
    }
}

impl From<octocrab::Error> for ForgeError {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                let status = source.status_code.as_u16();
                if status == 404 {
                    ForgeError::NotFound(source.message.clone())
                } else {
                    ForgeError::Api {
                        status,
                        message: source.message.clone(),
                    }
                }
            }
            other => ForgeError::Client(Box::new(other)),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("required inputs are missing: {}", .0.join(", "))]
    MissingInputs(Vec<&'static str>),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{operation}: {source}")]
    Forge {
        operation: String,
        #[source]
        source: ForgeError,
    },

    #[error("ref not found: {0}")]
    RefNotFound(String),

    #[error(transparent)]
    Local(#[from] anyhow::Error),

    #[error("pull request #{number} was not merged: {message}")]
    MergeRejected { number: u64, message: String },

    #[error("default branch is now {target} but protection was not copied from {base}: {source}")]
    ProtectionNotCopied {
        base: String,
        target: String,
        #[source]
        source: Box<Error>,
    },

    #[error("failed to update base branch of PR {url} ({remaining} PRs left unprocessed): {source}")]
    PullRetarget {
        url: String,
        remaining: usize,
        #[source]
        source: ForgeError,
    },
}

/// Attaches the name of the forge operation to a provider failure.
pub trait ForgeResultExt<T> {
    fn operation(self, operation: &str) -> Result<T>;
}

impl<T> ForgeResultExt<T> for std::result::Result<T, ForgeError> {
    fn operation(self, operation: &str) -> Result<T> {
        self.map_err(|source| Error::Forge {
            operation: operation.to_string(),
            source,
        })
    }
}
