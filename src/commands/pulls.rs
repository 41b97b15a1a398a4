use tracing::{info, warn, Dispatch};

use super::branches::resolve_ref;
use super::finish;
use crate::cli::Config;
use crate::error::{Error, ForgeResultExt};
use crate::models::{ListPulls, MergeMethod, MergeRequest, PullRequest, PullRequestEdit, PullState};
use crate::provider::Provider;

const PER_PAGE: u8 = 100;

/// Every open pull request based on `base`, across all pages.
async fn open_pulls<P: Provider>(
    provider: &P,
    config: &Config,
    base: &str,
) -> Result<Vec<PullRequest>, Error> {
    let mut pulls = Vec::new();
    let mut params = ListPulls {
        state: PullState::Open,
        base: base.to_string(),
        per_page: PER_PAGE,
        page: 1,
    };

    loop {
        let page = provider
            .list_pulls(&config.owner, &config.repo, &params)
            .await
            .operation("list pull requests")?;
        pulls.extend(page.items);

        match page.next_page {
            Some(next) => params.page = next,
            None => break,
        }
    }

    Ok(pulls)
}

/// Moves every open pull request from the base branch to the target.
pub struct UpdatePulls<'a, P> {
    config: &'a Config,
    provider: &'a P,
    logger: Dispatch,
}

impl<'a, P: Provider> UpdatePulls<'a, P> {
    pub fn new(config: &'a Config, provider: &'a P, logger: Dispatch) -> Self {
        UpdatePulls {
            config,
            provider,
            logger,
        }
    }

    pub async fn run(&self) -> i32 {
        finish(&self.logger, self.retarget()).await
    }

    async fn retarget(&self) -> Result<(), Error> {
        let config = self.config;
        let pulls = open_pulls(self.provider, config, &config.base).await?;

        if pulls.is_empty() {
            info!("There are no open PR's to update");
            return Ok(());
        }
        info!(count = pulls.len(), "Updating base branch of open PR's to {}", config.target);

        // Fail early if the new base is missing rather than on the first edit.
        resolve_ref(self.provider, config, &config.target).await?;

        let edit = PullRequestEdit {
            base: Some(config.target.clone()),
            state: None,
        };

        for (index, pull) in pulls.iter().enumerate() {
            if let Err(source) = self
                .provider
                .edit_pull(&config.owner, &config.repo, pull.number, &edit)
                .await
            {
                let rest = &pulls[index + 1..];
                for skipped in rest {
                    warn!(url = %skipped.display_url(), "PR was not updated");
                }
                return Err(Error::PullRetarget {
                    url: pull.display_url().to_string(),
                    remaining: rest.len(),
                    source,
                });
            }
            info!(url = %pull.display_url(), "Updated base branch");
        }

        info!("Success!");
        Ok(())
    }
}

pub struct ClosePull<'a, P> {
    config: &'a Config,
    provider: &'a P,
    logger: Dispatch,
    number: u64,
}

impl<'a, P: Provider> ClosePull<'a, P> {
    pub fn new(config: &'a Config, provider: &'a P, logger: Dispatch, number: u64) -> Self {
        ClosePull {
            config,
            provider,
            logger,
            number,
        }
    }

    pub async fn run(&self) -> i32 {
        finish(&self.logger, self.close()).await
    }

    async fn close(&self) -> Result<(), Error> {
        let edit = PullRequestEdit {
            base: None,
            state: Some(PullState::Closed),
        };

        let pull = self
            .provider
            .edit_pull(&self.config.owner, &self.config.repo, self.number, &edit)
            .await
            .operation("close pull request")?;

        info!(url = %pull.display_url(), "Closed PR #{}", pull.number);
        Ok(())
    }
}

/// Squash-merges a pull request. A merge the forge declines is an error even
/// when the call itself succeeds.
pub struct MergePull<'a, P> {
    config: &'a Config,
    provider: &'a P,
    logger: Dispatch,
    number: u64,
}

impl<'a, P: Provider> MergePull<'a, P> {
    pub fn new(config: &'a Config, provider: &'a P, logger: Dispatch, number: u64) -> Self {
        MergePull {
            config,
            provider,
            logger,
            number,
        }
    }

    pub async fn run(&self) -> i32 {
        finish(&self.logger, self.merge()).await
    }

    async fn merge(&self) -> Result<(), Error> {
        let request = MergeRequest {
            commit_title: format!(
                "Update references from {} to {}",
                self.config.base, self.config.target
            ),
            merge_method: MergeMethod::Squash,
        };

        let result = self
            .provider
            .merge_pull(&self.config.owner, &self.config.repo, self.number, &request)
            .await
            .operation("merge pull request")?;

        if !result.merged {
            return Err(Error::MergeRejected {
                number: self.number,
                message: result.message,
            });
        }

        info!(sha = ?result.sha, "Merged PR #{}", self.number);
        Ok(())
    }
}
