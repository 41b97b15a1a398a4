use async_trait::async_trait;

use crate::error::ForgeError;
use crate::models::{
    BranchProtection, GitRef, ListPulls, MergeRequest, MergeResult, NewPullRequest, NewRef,
    ProtectionRequest, PullPage, PullRequest, PullRequestEdit, Repository,
};

/// Git reference operations (`/repos/{owner}/{repo}/git/refs`).
#[async_trait]
pub trait GitRefs {
    async fn get_ref(&self, owner: &str, repo: &str, branch: &str) -> Result<GitRef, ForgeError>;

    async fn create_ref(&self, owner: &str, repo: &str, new_ref: &NewRef)
        -> Result<GitRef, ForgeError>;

    async fn delete_ref(&self, owner: &str, repo: &str, branch: &str) -> Result<(), ForgeError>;
}

/// Repository settings and branch protection.
#[async_trait]
pub trait Repositories {
    async fn set_default_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Repository, ForgeError>;

    async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection, ForgeError>;

    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        request: &ProtectionRequest,
    ) -> Result<BranchProtection, ForgeError>;

    async fn remove_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<(), ForgeError>;
}

#[async_trait]
pub trait PullRequests {
    async fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        params: &ListPulls,
    ) -> Result<PullPage, ForgeError>;

    async fn create_pull(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, ForgeError>;

    async fn edit_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        edit: &PullRequestEdit,
    ) -> Result<PullRequest, ForgeError>;

    async fn merge_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        merge: &MergeRequest,
    ) -> Result<MergeResult, ForgeError>;
}

/// Everything the migration commands need from the forge.
pub trait Provider: GitRefs + Repositories + PullRequests + Send + Sync {}

impl<T> Provider for T where T: GitRefs + Repositories + PullRequests + Send + Sync {}
