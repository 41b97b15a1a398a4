use crate::models::{
    Account, App, BranchProtection, PullRequestReviews, RequiredStatusChecks, Restrictions, Team,
    Toggle,
};

/// Protection with every rule group switched on.
pub fn get_full_protection() -> BranchProtection {
    BranchProtection {
        required_status_checks: Some(RequiredStatusChecks {
            strict: true,
            contexts: vec!["ci/build".to_string(), "ci/test".to_string()],
        }),
        required_pull_request_reviews: Some(PullRequestReviews {
            dismissal_restrictions: Some(Restrictions {
                users: vec![Account {
                    login: "octocat".to_string(),
                }],
                teams: vec![Team {
                    slug: "maintainers".to_string(),
                }],
                apps: vec![],
            }),
            dismiss_stale_reviews: true,
            require_code_owner_reviews: true,
            required_approving_review_count: 2,
            require_last_push_approval: false,
        }),
        enforce_admins: Some(Toggle { enabled: true }),
        restrictions: Some(Restrictions {
            users: vec![Account {
                login: "release-bot".to_string(),
            }],
            teams: vec![],
            apps: vec![App {
                slug: "deployer".to_string(),
            }],
        }),
        required_linear_history: Some(Toggle { enabled: true }),
        allow_force_pushes: Some(Toggle { enabled: false }),
        allow_deletions: Some(Toggle { enabled: false }),
        required_conversation_resolution: Some(Toggle { enabled: true }),
    }
}

/// Protection that only requires reviews, with a zero approval count.
pub fn get_reviews_only_protection() -> BranchProtection {
    BranchProtection {
        required_pull_request_reviews: Some(PullRequestReviews {
            dismiss_stale_reviews: true,
            ..Default::default()
        }),
        ..Default::default()
    }
}
