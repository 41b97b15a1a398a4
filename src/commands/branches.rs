use tracing::{error, info, warn, Dispatch};

use super::finish;
use crate::cli::Config;
use crate::error::{Error, ForgeResultExt};
use crate::models::{branch_ref, GitRef, NewRef};
use crate::provider::Provider;

/// Looks up the head of `branch`, reporting a missing branch as [`Error::RefNotFound`].
pub(crate) async fn resolve_ref<P: Provider>(
    provider: &P,
    config: &Config,
    branch: &str,
) -> Result<GitRef, Error> {
    provider
        .get_ref(&config.owner, &config.repo, branch)
        .await
        .map_err(|err| {
            if err.is_not_found() {
                Error::RefNotFound(branch_ref(branch))
            } else {
                Error::Forge {
                    operation: format!("get ref {}", branch_ref(branch)),
                    source: err,
                }
            }
        })
}

/// Creates each listed branch at the head commit of the base branch.
pub struct CreateBranches<'a, P> {
    config: &'a Config,
    provider: &'a P,
    logger: Dispatch,
    branches: Vec<String>,
}

impl<'a, P: Provider> CreateBranches<'a, P> {
    pub fn new(config: &'a Config, provider: &'a P, logger: Dispatch, branches: Vec<String>) -> Self {
        CreateBranches {
            config,
            provider,
            logger,
            branches,
        }
    }

    pub async fn run(&self) -> i32 {
        finish(&self.logger, self.create_all()).await
    }

    async fn create_all(&self) -> Result<(), Error> {
        for branch in &self.branches {
            info!("Creating new branch {} off of {}", branch, self.config.base);
            if let Err(err) = self.create_branch(branch).await {
                error!(branch = %branch, "Failed to create branch");
                return Err(err);
            }
        }

        info!("Success!");
        Ok(())
    }

    // The base is looked up again for every branch so each creation stands alone.
    async fn create_branch(&self, branch: &str) -> Result<(), Error> {
        let base = resolve_ref(self.provider, self.config, &self.config.base).await?;

        let new_ref = NewRef::branch(branch, &base.object.sha);
        self.provider
            .create_ref(&self.config.owner, &self.config.repo, &new_ref)
            .await
            .operation("create ref")?;

        info!(branch = %branch, sha = %base.object.sha, "Created branch");
        Ok(())
    }
}

/// Removes protection from and deletes each listed branch. Failures are logged
/// and skipped: a branch that is already gone or unprotected is the goal.
pub struct DeleteBranches<'a, P> {
    config: &'a Config,
    provider: &'a P,
    logger: Dispatch,
    branches: Vec<String>,
}

impl<'a, P: Provider> DeleteBranches<'a, P> {
    pub fn new(config: &'a Config, provider: &'a P, logger: Dispatch, branches: Vec<String>) -> Self {
        DeleteBranches {
            config,
            provider,
            logger,
            branches,
        }
    }

    pub async fn run(&self) -> i32 {
        finish(&self.logger, self.delete_all()).await
    }

    async fn delete_all(&self) -> Result<(), Error> {
        let (owner, repo) = (&self.config.owner, &self.config.repo);

        for branch in &self.branches {
            info!(branch = %branch, "Attempting to remove branch protection from branch");
            match self.provider.remove_branch_protection(owner, repo, branch).await {
                Ok(()) => info!(branch = %branch, "Removed branch protection"),
                Err(err) if err.is_not_found() => {
                    info!(branch = %branch, "Branch is not protected")
                }
                Err(err) => warn!(branch = %branch, "Failed to remove branch protection: {err}"),
            }

            info!(branch = %branch, "Attempting to delete branch");
            match self.provider.delete_ref(owner, repo, branch).await {
                Ok(()) => info!(
                    branch = %branch,
                    reference = %branch_ref(branch),
                    "Success! branch has been deleted"
                ),
                Err(err) => warn!(branch = %branch, "Failed to delete branch: {err}"),
            }
        }

        Ok(())
    }
}
