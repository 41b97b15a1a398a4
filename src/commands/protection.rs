use tracing::{debug, info, warn, Dispatch};

use super::finish;
use crate::cli::Config;
use crate::error::{Error, ForgeResultExt};
use crate::models::{BranchProtection, ProtectionRequest, PullRequestReviewsRequest};
use crate::provider::Provider;

/// The smallest approval count the forge accepts once reviews are required.
const MIN_APPROVING_REVIEWS: u32 = 1;

#[derive(Debug, PartialEq)]
pub enum Outcome {
    Copied,
    SourceUnprotected,
}

/// Builds the write request that reproduces `source` on another branch.
///
/// Only rule groups present on the source end up in the request.
pub fn protection_request(source: &BranchProtection) -> ProtectionRequest {
    let reviews = source
        .required_pull_request_reviews
        .as_ref()
        .map(|reviews| PullRequestReviewsRequest {
            dismissal_restrictions: reviews.dismissal_restrictions.as_ref().map(Into::into),
            dismiss_stale_reviews: reviews.dismiss_stale_reviews,
            require_code_owner_reviews: reviews.require_code_owner_reviews,
            required_approving_review_count: reviews
                .required_approving_review_count
                .max(MIN_APPROVING_REVIEWS),
            require_last_push_approval: reviews.require_last_push_approval,
        });

    ProtectionRequest {
        required_status_checks: source.required_status_checks.clone(),
        enforce_admins: source.enforce_admins.map(|toggle| toggle.enabled),
        required_pull_request_reviews: reviews,
        restrictions: source.restrictions.as_ref().map(Into::into),
        required_linear_history: source.required_linear_history.map(|toggle| toggle.enabled),
        allow_force_pushes: source.allow_force_pushes.map(|toggle| toggle.enabled),
        allow_deletions: source.allow_deletions.map(|toggle| toggle.enabled),
        required_conversation_resolution: source
            .required_conversation_resolution
            .map(|toggle| toggle.enabled),
    }
}

/// Copies the protection of `from` onto `to`. An unprotected source is not an error.
pub async fn copy_protection<P: Provider>(
    provider: &P,
    config: &Config,
    from: &str,
    to: &str,
) -> Result<Outcome, Error> {
    let (owner, repo) = (&config.owner, &config.repo);

    let source = match provider.get_branch_protection(owner, repo, from).await {
        Ok(source) => source,
        Err(err) if err.is_not_found() => {
            info!(branch = %from, "Branch has no protection, nothing to copy");
            return Ok(Outcome::SourceUnprotected);
        }
        Err(err) => return Err(err).operation("get branch protection"),
    };

    let request = protection_request(&source);
    debug!(?request, "Translated protection");

    provider
        .update_branch_protection(owner, repo, to, &request)
        .await
        .operation("update branch protection")?;

    info!(from = %from, to = %to, "Copied branch protection");
    Ok(Outcome::Copied)
}

/// Makes the target the repository's default branch and moves the base's
/// protection over to it.
pub struct UpdateDefault<'a, P> {
    config: &'a Config,
    provider: &'a P,
    logger: Dispatch,
}

impl<'a, P: Provider> UpdateDefault<'a, P> {
    pub fn new(config: &'a Config, provider: &'a P, logger: Dispatch) -> Self {
        UpdateDefault {
            config,
            provider,
            logger,
        }
    }

    pub async fn run(&self) -> i32 {
        finish(&self.logger, self.update()).await
    }

    async fn update(&self) -> Result<(), Error> {
        let config = self.config;
        info!("Setting default branch to {}", config.target);

        let repository = self
            .provider
            .set_default_branch(&config.owner, &config.repo, &config.target)
            .await
            .operation("update default branch")?;

        let default = repository
            .default_branch
            .unwrap_or_else(|| config.target.clone());
        info!(repository = %repository.name, "Default branch is now {default}");

        if let Err(err) = copy_protection(self.provider, config, &config.base, &config.target).await {
            warn!(
                "Default branch changed to {} but branch protection still lives on {}",
                config.target, config.base
            );
            return Err(Error::ProtectionNotCopied {
                base: config.base.clone(),
                target: config.target.clone(),
                source: Box::new(err),
            });
        }

        info!("Success!");
        Ok(())
    }
}
