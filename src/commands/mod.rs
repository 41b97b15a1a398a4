//! One module per group of subcommands. Every command owns the logger it was
//! built with and reports success as exit code 0, failure as 1.

pub mod branches;
pub mod protection;
pub mod pulls;
pub mod references;

use std::future::Future;

use tracing::instrument::WithSubscriber;
use tracing::{error, Dispatch};

use crate::error::Error;

pub use branches::{CreateBranches, DeleteBranches};
pub use protection::UpdateDefault;
pub use pulls::{ClosePull, MergePull, UpdatePulls};
pub use references::{RewriteScope, UpdateReferences};

/// Runs `work` under `logger` and turns its outcome into an exit code.
pub(crate) async fn finish<F>(logger: &Dispatch, work: F) -> i32
where
    F: Future<Output = Result<(), Error>>,
{
    async move {
        match work.await {
            Ok(()) => 0,
            Err(err) => {
                error!("{err}");
                1
            }
        }
    }
    .with_subscriber(logger.clone())
    .await
}
