use std::path::Path;

use anyhow::Context;
use tracing::{info, warn, Dispatch};

use super::finish;
use crate::cli::Config;
use crate::error::{Error, ForgeResultExt};
use crate::git::{RemoteRepository, Signature, Vcs};
use crate::models::NewPullRequest;
use crate::provider::Provider;
use crate::rewrite::Rewriter;

pub use crate::rewrite::RewriteScope;

const CLONE_PREFIX: &str = "tmp-clone-";

fn commit_author(config: &Config) -> Signature {
    Signature {
        name: "mainline".to_string(),
        email: format!("mainline@{}.noreply.github.com", config.owner),
    }
}

fn pull_body(config: &Config) -> String {
    let intro = format!(
        "This PR was created to update all references from '{}' to '{}' in this repo.",
        config.base, config.target
    );
    let note =
        "**NOTE**: This PR was generated automatically. Please take a close look before approving and merging!";

    match config.user_exclusions().as_slice() {
        [] => format!("{intro}<br /><br />{note}"),
        excluded => format!(
            "{intro}<br /><br />The following paths have been excluded: '{}'<br /><br />{note}",
            excluded.join(", ")
        ),
    }
}

/// Rewrites references to the base branch on the temp branch and opens a pull
/// request into the target. Does nothing when no file needs changing.
pub struct UpdateReferences<'a, P, V> {
    config: &'a Config,
    provider: &'a P,
    vcs: &'a V,
    logger: Dispatch,
    scope: RewriteScope,
}

impl<'a, P: Provider, V: Vcs> UpdateReferences<'a, P, V> {
    pub fn new(
        config: &'a Config,
        provider: &'a P,
        vcs: &'a V,
        logger: Dispatch,
        scope: RewriteScope,
    ) -> Self {
        UpdateReferences {
            config,
            provider,
            vcs,
            logger,
            scope,
        }
    }

    pub async fn run(&self) -> i32 {
        finish(&self.logger, self.update()).await
    }

    async fn update(&self) -> Result<(), Error> {
        let workdir = tempfile::Builder::new()
            .prefix(CLONE_PREFIX)
            .tempdir()
            .context("failed to create temp directory")?;
        info!(dir = %workdir.path().display(), "Created local temp dir");

        let result = self.update_in(workdir.path()).await;

        if let Err(err) = workdir.close() {
            warn!("Failed to remove temp dir: {err}");
        }

        result
    }

    async fn update_in(&self, dir: &Path) -> Result<(), Error> {
        let config = self.config;
        let remote = RemoteRepository::github(&config.owner, &config.repo, &config.token);

        let head = self
            .vcs
            .clone_branch(&remote, &config.temp_branch, dir)
            .await
            .with_context(|| format!("failed to clone {}", config.temp_branch))?;
        info!(branch = %config.temp_branch, sha = %head, "Cloned repo into local dir");

        let rewriter = Rewriter::new(&config.base, &config.target, &config.exclusion, self.scope)?;
        let changed = rewriter.run(dir).await?;

        if changed.is_empty() {
            info!("No references to {} found, nothing to do", config.base);
            return Ok(());
        }
        info!(files = changed.len(), "Updated references");

        let message = format!("Update references from {} to {}", config.base, config.target);
        let sha = self
            .vcs
            .commit_all(dir, &message, &commit_author(config))
            .await
            .context("failed to commit changes")?;

        info!(branch = %config.temp_branch, sha = %sha, "Pushing commit to remote");
        self.vcs
            .push(&remote, dir, &config.temp_branch)
            .await
            .context("failed to push changes")?;

        let pull = NewPullRequest {
            title: format!("Update References from {} to {}", config.base, config.target),
            head: config.temp_branch.clone(),
            base: config.target.clone(),
            body: pull_body(config),
            maintainer_can_modify: true,
        };
        info!(
            branch = %config.temp_branch,
            target = %config.target,
            "Creating PR to merge changes from branch into target"
        );
        let created = self
            .provider
            .create_pull(&config.owner, &config.repo, &pull)
            .await
            .operation("open pull request")?;

        info!(url = %created.display_url(), "Success! Review and merge the open PR");
        Ok(())
    }
}
