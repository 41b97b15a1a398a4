use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ForgeError;
use crate::models::{
    Account, App, BranchProtection, GitObject, GitRef, ListPulls, MergeRequest, MergeResult,
    NewPullRequest, NewRef, ProtectionRequest, PullPage, PullRequest, PullRequestBase,
    PullRequestEdit, PullRequestReviews, PullState, Repository, Restrictions, RestrictionsRequest,
    Team, Toggle,
};
use crate::provider::{GitRefs, PullRequests, Repositories};

pub const MOCK_OWNER: &str = "octo-org";
pub const MOCK_REPO: &str = "test";
pub const MASTER_SHA: &str = "e5615943864ba6af8a4cec905aceeeb94b2a2ad6";

/// A forge call as seen by [`MockProvider`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    GetRef(String),
    CreateRef(NewRef),
    DeleteRef(String),
    SetDefaultBranch(String),
    GetProtection(String),
    UpdateProtection(String, ProtectionRequest),
    RemoveProtection(String),
    ListPulls(ListPulls),
    CreatePull(NewPullRequest),
    EditPull(u64, PullRequestEdit),
    MergePull(u64, MergeRequest),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    refs: BTreeMap<String, String>,
    protections: BTreeMap<String, BranchProtection>,
    pulls: Vec<PullRequest>,
    default_branch: String,
    failing_refs: HashSet<String>,
    failing_pulls: HashSet<u64>,
    failing_protection_updates: bool,
    reject_merges: bool,
}

/// In-memory forge for `octo-org/test`. Starts with a single `master` branch
/// at [`MASTER_SHA`] and records every call it receives.
pub struct MockProvider {
    page_size: usize,
    state: Mutex<State>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        let mut refs = BTreeMap::new();
        refs.insert("master".to_string(), MASTER_SHA.to_string());

        MockProvider {
            page_size: 2,
            state: Mutex::new(State {
                refs,
                default_branch: "master".to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn with_branch(self, branch: &str, sha: &str) -> Self {
        self.state
            .lock()
            .refs
            .insert(branch.to_string(), sha.to_string());
        self
    }

    pub fn with_protection(self, branch: &str, protection: BranchProtection) -> Self {
        self.state
            .lock()
            .protections
            .insert(branch.to_string(), protection);
        self
    }

    pub fn with_pulls(self, pulls: Vec<PullRequest>) -> Self {
        self.state.lock().pulls = pulls;
        self
    }

    /// Makes `create_ref` fail for `branch`.
    pub fn failing_ref(self, branch: &str) -> Self {
        self.state.lock().failing_refs.insert(branch.to_string());
        self
    }

    /// Makes `edit_pull` fail for pull request `number`.
    pub fn failing_pull(self, number: u64) -> Self {
        self.state.lock().failing_pulls.insert(number);
        self
    }

    pub fn failing_protection_updates(self) -> Self {
        self.state.lock().failing_protection_updates = true;
        self
    }

    /// Merges are accepted by the API but come back with `merged: false`.
    pub fn rejecting_merges(self) -> Self {
        self.state.lock().reject_merges = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn created_refs(&self) -> Vec<NewRef> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateRef(new_ref) => Some(new_ref),
                _ => None,
            })
            .collect()
    }

    pub fn edited_pulls(&self) -> Vec<(u64, PullRequestEdit)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::EditPull(number, edit) => Some((number, edit)),
                _ => None,
            })
            .collect()
    }

    pub fn created_pulls(&self) -> Vec<NewPullRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreatePull(pull) => Some(pull),
                _ => None,
            })
            .collect()
    }

    pub fn branches(&self) -> Vec<String> {
        self.state.lock().refs.keys().cloned().collect()
    }

    pub fn protection(&self, branch: &str) -> Option<BranchProtection> {
        self.state.lock().protections.get(branch).cloned()
    }

    pub fn default_branch(&self) -> String {
        self.state.lock().default_branch.clone()
    }

    /// Records `call` after checking it targets `octo-org/test`.
    fn record(&self, owner: &str, repo: &str, call: Call) -> Result<(), ForgeError> {
        if owner != MOCK_OWNER || repo != MOCK_REPO {
            return Err(ForgeError::WrongRepository(format!("{owner}/{repo}")));
        }
        self.state.lock().calls.push(call);
        Ok(())
    }
}

/// A pull request against `base` as the mock would return it.
pub fn pull_request(number: u64, base: &str) -> PullRequest {
    PullRequest {
        number,
        url: format!("https://api.github.com/repos/{MOCK_OWNER}/{MOCK_REPO}/pulls/{number}"),
        html_url: Some(format!(
            "https://github.com/{MOCK_OWNER}/{MOCK_REPO}/pull/{number}"
        )),
        title: Some(format!("Change #{number}")),
        state: PullState::Open,
        base: PullRequestBase {
            ref_name: base.to_string(),
            label: Some(format!("{MOCK_OWNER}:{base}")),
        },
    }
}

fn branch_name(reference: &str) -> &str {
    reference.strip_prefix("refs/heads/").unwrap_or(reference)
}

#[async_trait]
impl GitRefs for MockProvider {
    async fn get_ref(&self, owner: &str, repo: &str, branch: &str) -> Result<GitRef, ForgeError> {
        self.record(owner, repo, Call::GetRef(branch.to_string()))?;

        let state = self.state.lock();
        let sha = state
            .refs
            .get(branch)
            .ok_or_else(|| ForgeError::NotFound(format!("refs/heads/{branch}")))?;

        Ok(GitRef {
            name: format!("refs/heads/{branch}"),
            object: GitObject {
                sha: sha.clone(),
                kind: Some("commit".to_string()),
            },
        })
    }

    async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        new_ref: &NewRef,
    ) -> Result<GitRef, ForgeError> {
        self.record(owner, repo, Call::CreateRef(new_ref.clone()))?;

        let branch = branch_name(&new_ref.name).to_string();
        let mut state = self.state.lock();
        if state.failing_refs.contains(&branch) {
            return Err(ForgeError::Api {
                status: 422,
                message: "Reference already exists".to_string(),
            });
        }
        state.refs.insert(branch, new_ref.sha.clone());

        Ok(GitRef {
            name: new_ref.name.clone(),
            object: GitObject {
                sha: new_ref.sha.clone(),
                kind: Some("commit".to_string()),
            },
        })
    }

    async fn delete_ref(&self, owner: &str, repo: &str, branch: &str) -> Result<(), ForgeError> {
        self.record(owner, repo, Call::DeleteRef(branch.to_string()))?;

        match self.state.lock().refs.remove(branch) {
            Some(_) => Ok(()),
            None => Err(ForgeError::Api {
                status: 422,
                message: "Reference does not exist".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Repositories for MockProvider {
    async fn set_default_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Repository, ForgeError> {
        self.record(owner, repo, Call::SetDefaultBranch(branch.to_string()))?;

        let mut state = self.state.lock();
        if !state.refs.contains_key(branch) {
            return Err(ForgeError::Api {
                status: 422,
                message: format!("default_branch {branch} does not exist"),
            });
        }
        state.default_branch = branch.to_string();

        Ok(Repository {
            name: repo.to_string(),
            default_branch: Some(branch.to_string()),
            html_url: Some(format!("https://github.com/{owner}/{repo}")),
        })
    }

    async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<BranchProtection, ForgeError> {
        self.record(owner, repo, Call::GetProtection(branch.to_string()))?;

        self.state
            .lock()
            .protections
            .get(branch)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound("Branch not protected".to_string()))
    }

    async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        request: &ProtectionRequest,
    ) -> Result<BranchProtection, ForgeError> {
        self.record(
            owner,
            repo,
            Call::UpdateProtection(branch.to_string(), request.clone()),
        )?;

        let mut state = self.state.lock();
        if state.failing_protection_updates {
            return Err(ForgeError::Api {
                status: 403,
                message: "Resource not accessible by integration".to_string(),
            });
        }

        let protection = applied_protection(request);
        state
            .protections
            .insert(branch.to_string(), protection.clone());
        Ok(protection)
    }

    async fn remove_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<(), ForgeError> {
        self.record(owner, repo, Call::RemoveProtection(branch.to_string()))?;

        match self.state.lock().protections.remove(branch) {
            Some(_) => Ok(()),
            None => Err(ForgeError::NotFound("Branch not protected".to_string())),
        }
    }
}

/// The protection the forge would report after applying `request`.
fn applied_protection(request: &ProtectionRequest) -> BranchProtection {
    fn restrictions(request: &RestrictionsRequest) -> Restrictions {
        Restrictions {
            users: request
                .users
                .iter()
                .map(|login| Account {
                    login: login.clone(),
                })
                .collect(),
            teams: request
                .teams
                .iter()
                .map(|slug| Team { slug: slug.clone() })
                .collect(),
            apps: request
                .apps
                .iter()
                .map(|slug| App { slug: slug.clone() })
                .collect(),
        }
    }
    let toggle = |flag: Option<bool>| flag.map(|enabled| Toggle { enabled });

    BranchProtection {
        required_status_checks: request.required_status_checks.clone(),
        required_pull_request_reviews: request.required_pull_request_reviews.as_ref().map(
            |reviews| PullRequestReviews {
                dismissal_restrictions: reviews.dismissal_restrictions.as_ref().map(restrictions),
                dismiss_stale_reviews: reviews.dismiss_stale_reviews,
                require_code_owner_reviews: reviews.require_code_owner_reviews,
                required_approving_review_count: reviews.required_approving_review_count,
                require_last_push_approval: reviews.require_last_push_approval,
            },
        ),
        enforce_admins: toggle(request.enforce_admins),
        restrictions: request.restrictions.as_ref().map(restrictions),
        required_linear_history: toggle(request.required_linear_history),
        allow_force_pushes: toggle(request.allow_force_pushes),
        allow_deletions: toggle(request.allow_deletions),
        required_conversation_resolution: toggle(request.required_conversation_resolution),
    }
}

#[async_trait]
impl PullRequests for MockProvider {
    async fn list_pulls(
        &self,
        owner: &str,
        repo: &str,
        params: &ListPulls,
    ) -> Result<PullPage, ForgeError> {
        self.record(owner, repo, Call::ListPulls(params.clone()))?;

        let state = self.state.lock();
        let matching: Vec<&PullRequest> = state
            .pulls
            .iter()
            .filter(|pull| pull.state == params.state && pull.base.ref_name == params.base)
            .collect();

        let page_size = self.page_size.min(params.per_page.max(1) as usize);
        let start = (params.page.max(1) as usize - 1) * page_size;
        let items: Vec<PullRequest> = matching
            .iter()
            .skip(start)
            .take(page_size)
            .map(|pull| (*pull).clone())
            .collect();
        let next_page = (start + page_size < matching.len()).then_some(params.page.max(1) + 1);

        Ok(PullPage { items, next_page })
    }

    async fn create_pull(
        &self,
        owner: &str,
        repo: &str,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, ForgeError> {
        self.record(owner, repo, Call::CreatePull(pull.clone()))?;

        let mut state = self.state.lock();
        if !state.refs.contains_key(&pull.head) {
            return Err(ForgeError::Api {
                status: 422,
                message: format!("head {} does not exist", pull.head),
            });
        }
        let number = state.pulls.iter().map(|p| p.number).max().unwrap_or(0) + 1;
        let mut created = pull_request(number, &pull.base);
        created.title = Some(pull.title.clone());
        state.pulls.push(created.clone());

        Ok(created)
    }

    async fn edit_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        edit: &PullRequestEdit,
    ) -> Result<PullRequest, ForgeError> {
        self.record(owner, repo, Call::EditPull(number, edit.clone()))?;

        let mut state = self.state.lock();
        if state.failing_pulls.contains(&number) {
            return Err(ForgeError::Api {
                status: 422,
                message: "Validation Failed".to_string(),
            });
        }
        let pull = state
            .pulls
            .iter_mut()
            .find(|pull| pull.number == number)
            .ok_or_else(|| ForgeError::NotFound(format!("pull request #{number}")))?;

        if let Some(base) = &edit.base {
            pull.base.ref_name = base.clone();
            pull.base.label = Some(format!("{owner}:{base}"));
        }
        if let Some(pull_state) = edit.state {
            pull.state = pull_state;
        }

        Ok(pull.clone())
    }

    async fn merge_pull(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        merge: &MergeRequest,
    ) -> Result<MergeResult, ForgeError> {
        self.record(owner, repo, Call::MergePull(number, merge.clone()))?;

        let mut state = self.state.lock();
        if state.reject_merges {
            return Ok(MergeResult {
                sha: None,
                merged: false,
                message: "Pull Request is not mergeable".to_string(),
            });
        }
        let pull = state
            .pulls
            .iter_mut()
            .find(|pull| pull.number == number)
            .ok_or_else(|| ForgeError::NotFound(format!("pull request #{number}")))?;
        pull.state = PullState::Closed;

        Ok(MergeResult {
            sha: Some(MASTER_SHA.to_string()),
            merged: true,
            message: "Pull Request successfully merged".to_string(),
        })
    }
}
