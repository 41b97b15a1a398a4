use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::{Octocrab, Page};

use crate::error::{Error, ForgeError};
use crate::models::{
    BranchProtection, GitRef, ListPulls, MergeRequest, MergeResult, NewPullRequest, NewRef,
    ProtectionRequest, PullPage, PullRequest, PullRequestEdit, Repository,
};
use crate::provider::{GitRefs, PullRequests, Repositories};

/// Budget for a single REST call. Loops over pages or branches get a fresh one per call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// [`Provider`](crate::provider::Provider) backed by the GitHub REST API.
pub struct GithubProvider {
    crab: Octocrab,
    timeout: Duration,
}

impl GithubProvider {
    /// Builds an authenticated client. `base_url` overrides `https://api.github.com`.
    pub fn configure(token: &str, base_url: Option<String>) -> Result<Self, Error> {
        if token.is_empty() {
            return Err(Error::Config(
                "cannot create GitHub client with empty token".to_string(),
            ));
        }

        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(url) = base_url {
            builder = builder
                .base_uri(url.as_str())
                .map_err(|err| Error::Config(format!("invalid GitHub API url {url}: {err}")))?;
        }
        builder.add_retry_config(RetryConfig::None);

        let crab = builder
            .build()
            .map_err(|err| Error::Config(format!("failed to build GitHub client: {err}")))?;

        Ok(GithubProvider {
            crab,
            timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn timed<T, F>(&self, call: F) -> Result<T, ForgeError>
    where
        F: Future<Output = octocrab::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(ForgeError::from),
            Err(_) => Err(ForgeError::Timeout(self.timeout)),
        }
    }

    async fn delete(&self, route: String) -> Result<(), ForgeError> {
        self.timed(async {
            let response = self.crab._delete(route, None::<&()>).await?;
            octocrab::map_github_error(response).await.map(drop)
        })
        .await
    }
}

#[async_trait]
impl GitRefs for GithubProvider {
    async fn get_ref(&self, owner: &str, repo: &str, branch: &str) -> Result<GitRef, ForgeError> {
        let route = format!("/repos/{owner}/{repo}/git/ref/heads/{branch}");
        self.timed(self.crab.get(route, None::<&()>)).await
    }

    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        new_ref: &NewRef,
    ) -> Result<GitRef, ForgeError> {
        let route = format!("/repos/{owner}/{repo}/git/refs");
        self.timed(self.crab.post(route, Some(new_ref))).await
    }

    async fn delete_ref(&self, owner: &str, repo: &str, branch: &str) -> Result<(), ForgeError> {
        self.delete(format!("/repos/{owner}/{repo}/git/refs/heads/{branch}"))
            .await
    }
}

#[derive(serde::Serialize)]
struct DefaultBranchEdit<'a> {
    default_branch: &'a str,
}

#[async_trait]
impl Repositories for GithubProvider {
    async fn set_default_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Repository, ForgeError> {
        let route = format!("/repos/{owner}/{repo}");
        let body = DefaultBranchEdit {
            default_branch: branch,
        };
        self.timed(self.crab.patch(route, Some(&body))).await
    }

    async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection, ForgeError> {
        let route = format!("/repos/{owner}/{repo}/branches/{branch}/protection");
        self.timed(self.crab.get(route, None::<&()>)).await
    }

    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        request: &ProtectionRequest,
    ) -> Result<BranchProtection, ForgeError> {
        let route = format!("/repos/{owner}/{repo}/branches/{branch}/protection");
        self.timed(self.crab.put(route, Some(request))).await
    }

    async fn remove_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<(), ForgeError> {
        self.delete(format!(
            "/repos/{owner}/{repo}/branches/{branch}/protection"
        ))
        .await
    }
}

#[async_trait]
impl PullRequests for GithubProvider {
    async fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        params: &ListPulls,
    ) -> Result<PullPage, ForgeError> {
        let route = format!("/repos/{owner}/{repo}/pulls");
        let page: Page<PullRequest> = self.timed(self.crab.get(route, Some(params))).await?;

        Ok(PullPage {
            next_page: page.next.as_ref().map(|_| params.page + 1),
            items: page.items,
        })
    }

    async fn create_pull(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, ForgeError> {
        let route = format!("/repos/{owner}/{repo}/pulls");
        self.timed(self.crab.post(route, Some(pull))).await
    }

    async fn edit_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        edit: &PullRequestEdit,
    ) -> Result<PullRequest, ForgeError> {
        let route = format!("/repos/{owner}/{repo}/pulls/{number}");
        self.timed(self.crab.patch(route, Some(edit))).await
    }

    async fn merge_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        merge: &MergeRequest,
    ) -> Result<MergeResult, ForgeError> {
        let route = format!("/repos/{owner}/{repo}/pulls/{number}/merge");
        self.timed(self.crab.put(route, Some(merge))).await
    }
}
