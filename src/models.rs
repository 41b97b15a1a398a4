//! Request and response bodies exchanged with the GitHub REST API.
//!
//! Only the fields the migration reads or writes are modelled; everything
//! else in the responses is ignored during deserialization.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: GitObject,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GitObject {
    pub sha: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub sha: String,
}

impl NewRef {
    pub fn branch(branch: &str, sha: &str) -> Self {
        NewRef {
            name: branch_ref(branch),
            sha: sha.to_string(),
        }
    }
}

pub fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{branch}")
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

// Branch protection as returned by `GET /repos/{owner}/{repo}/branches/{branch}/protection`.
// Every rule group is optional; a missing group means the rule is off.

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchProtection {
    pub required_status_checks: Option<RequiredStatusChecks>,
    pub required_pull_request_reviews: Option<PullRequestReviews>,
    pub enforce_admins: Option<Toggle>,
    pub restrictions: Option<Restrictions>,
    pub required_linear_history: Option<Toggle>,
    pub allow_force_pushes: Option<Toggle>,
    pub allow_deletions: Option<Toggle>,
    pub required_conversation_resolution: Option<Toggle>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredStatusChecks {
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub contexts: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequestReviews {
    pub dismissal_restrictions: Option<Restrictions>,
    #[serde(default)]
    pub dismiss_stale_reviews: bool,
    #[serde(default)]
    pub require_code_owner_reviews: bool,
    #[serde(default)]
    pub required_approving_review_count: u32,
    #[serde(default)]
    pub require_last_push_approval: bool,
}

/// The users, teams and apps named by a dismissal or push restriction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Restrictions {
    #[serde(default)]
    pub users: Vec<Account>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub apps: Vec<App>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub login: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub slug: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub slug: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Toggle {
    #[serde(default)]
    pub enabled: bool,
}

// Body of `PUT /repos/{owner}/{repo}/branches/{branch}/protection`. The API
// requires the first four keys to be present, `null` switches the rule off.

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ProtectionRequest {
    pub required_status_checks: Option<RequiredStatusChecks>,
    pub enforce_admins: Option<bool>,
    pub required_pull_request_reviews: Option<PullRequestReviewsRequest>,
    pub restrictions: Option<RestrictionsRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_linear_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_force_pushes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_deletions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_conversation_resolution: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PullRequestReviewsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismissal_restrictions: Option<RestrictionsRequest>,
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
    pub required_approving_review_count: u32,
    pub require_last_push_approval: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RestrictionsRequest {
    pub users: Vec<String>,
    pub teams: Vec<String>,
    pub apps: Vec<String>,
}

impl From<&Restrictions> for RestrictionsRequest {
    fn from(restrictions: &Restrictions) -> Self {
        RestrictionsRequest {
            users: restrictions.users.iter().map(|u| u.login.clone()).collect(),
            teams: restrictions.teams.iter().map(|t| t.slug.clone()).collect(),
            apps: restrictions.apps.iter().map(|a| a.slug.clone()).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullState {
    Open,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub state: PullState,
    pub base: PullRequestBase,
}

impl PullRequest {
    /// The browser URL when the forge returned one, the API URL otherwise.
    pub fn display_url(&self) -> &str {
        self.html_url.as_deref().unwrap_or(&self.url)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PullRequestBase {
    #[serde(rename = "ref")]
    pub ref_name: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Query string of `GET /repos/{owner}/{repo}/pulls`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ListPulls {
    pub state: PullState,
    pub base: String,
    pub per_page: u8,
    pub page: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PullPage {
    pub items: Vec<PullRequest>,
    pub next_page: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub head: String,
    pub base: String,
    pub body: String,
    pub maintainer_can_modify: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PullRequestEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PullState>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    Merge,
    Squash,
    Rebase,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergeRequest {
    pub commit_title: String,
    pub merge_method: MergeMethod,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MergeResult {
    #[serde(default)]
    pub sha: Option<String>,
    pub merged: bool,
    #[serde(default)]
    pub message: String,
}
