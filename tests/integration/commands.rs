use mainline::cli::{dispatch, Command, Config, InputArgs};
use mainline::fixtures::logs::CapturedLogs;
use mainline::github_provider::GithubProvider;
use mainline::mocks::MockVcs;
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

use crate::mocks::github::{
    create_ref_mock, edit_pull_mock, edit_repository_mock, error_json, get_protection_mock,
    get_ref_mock, list_pulls_mock, pull_json, update_protection_mock,
};

const OWNER: &str = "octo-org";
const REPO: &str = "test";
const SHA: &str = "abc123";

fn config() -> Config {
    Config {
        owner: OWNER.to_string(),
        repo: REPO.to_string(),
        base: "master".to_string(),
        target: "main".to_string(),
        token: "token".to_string(),
        exclusion: vec![".git/".to_string(), "go.mod".to_string(), "go.sum".to_string()],
        temp_branch: "update-references".to_string(),
    }
}

async fn run(server: &MockServer, command: Command, logs: &CapturedLogs) -> i32 {
    let provider = GithubProvider::configure("token", Some(server.uri())).unwrap();

    dispatch(&command, &config(), &provider, &MockVcs::new(), logs.logger()).await
}

#[tokio::test]
async fn create_branches_off_master() {
    let server = MockServer::start().await;
    get_ref_mock(OWNER, REPO, "master", SHA)
        .expect(2)
        .mount(&server)
        .await;
    create_ref_mock(OWNER, REPO, "update-references", SHA)
        .mount(&server)
        .await;
    create_ref_mock(OWNER, REPO, "main", SHA).mount(&server).await;
    let logs = CapturedLogs::new();

    let exit = run(&server, Command::CreateBranches(InputArgs::default()), &logs).await;

    assert_eq!(exit, 0, "{}", logs.contents());
    let output = logs.contents();
    assert!(output.contains("Creating new branch update-references off of master"));
    assert!(output.contains("Creating new branch main off of master"));
    assert!(output.contains("Success!"));
}

#[tokio::test]
async fn update_pulls_with_nothing_open() {
    let server = MockServer::start().await;
    list_pulls_mock(OWNER, REPO, "master", 1, vec![], None)
        .mount(&server)
        .await;
    let logs = CapturedLogs::new();

    let exit = run(&server, Command::UpdatePulls(InputArgs::default()), &logs).await;

    assert_eq!(exit, 0, "{}", logs.contents());
    assert!(logs.contents().contains("There are no open PR's to update"));
}

#[tokio::test]
async fn update_pulls_across_pages() {
    let server = MockServer::start().await;
    let next = format!(
        "{}/repos/{OWNER}/{REPO}/pulls?state=open&base=master&per_page=100&page=2",
        server.uri()
    );
    list_pulls_mock(
        OWNER,
        REPO,
        "master",
        1,
        vec![pull_json(OWNER, REPO, 1, "master")],
        Some(next),
    )
    .mount(&server)
    .await;
    list_pulls_mock(OWNER, REPO, "master", 2, vec![pull_json(OWNER, REPO, 2, "master")], None)
        .mount(&server)
        .await;
    get_ref_mock(OWNER, REPO, "main", SHA).mount(&server).await;
    for number in [1, 2] {
        edit_pull_mock(
            OWNER,
            REPO,
            number,
            json!({ "base": "main" }),
            ResponseTemplate::new(200).set_body_json(pull_json(OWNER, REPO, number, "main")),
        )
        .mount(&server)
        .await;
    }
    let logs = CapturedLogs::new();

    let exit = run(&server, Command::UpdatePulls(InputArgs::default()), &logs).await;

    assert_eq!(exit, 0, "{}", logs.contents());
}

#[tokio::test]
async fn update_pulls_stops_at_a_rejected_edit() {
    let server = MockServer::start().await;
    list_pulls_mock(
        OWNER,
        REPO,
        "master",
        1,
        vec![
            pull_json(OWNER, REPO, 1, "master"),
            pull_json(OWNER, REPO, 2, "master"),
        ],
        None,
    )
    .mount(&server)
    .await;
    get_ref_mock(OWNER, REPO, "main", SHA).mount(&server).await;
    edit_pull_mock(
        OWNER,
        REPO,
        1,
        json!({ "base": "main" }),
        ResponseTemplate::new(422).set_body_json(error_json("Validation Failed")),
    )
    .mount(&server)
    .await;
    let logs = CapturedLogs::new();

    let exit = run(&server, Command::UpdatePulls(InputArgs::default()), &logs).await;

    assert_eq!(exit, 1);
    let output = logs.contents();
    assert!(output.contains("https://github.com/octo-org/test/pull/1 (1 PRs left unprocessed)"));
    assert!(output.contains("url=https://github.com/octo-org/test/pull/2"));
}

#[tokio::test]
async fn update_default_copies_protection() {
    let server = MockServer::start().await;
    edit_repository_mock(OWNER, REPO, "main").mount(&server).await;
    let source = json!({
        "url": "https://api.github.com/repos/octo-org/test/branches/master/protection",
        "required_status_checks": { "strict": true, "contexts": ["ci/build"] },
        "required_pull_request_reviews": {
            "dismissal_restrictions": {
                "users": [{ "login": "octocat", "id": 1 }],
                "teams": [{ "slug": "maintainers", "id": 2 }],
            },
            "dismiss_stale_reviews": true,
            "require_code_owner_reviews": false,
            "required_approving_review_count": 0,
        },
        "enforce_admins": { "enabled": true },
        "restrictions": {
            "users": [{ "login": "release-bot" }],
            "teams": [],
            "apps": [{ "slug": "deployer" }],
        },
        "required_linear_history": { "enabled": false },
        "allow_force_pushes": { "enabled": false },
        "allow_deletions": { "enabled": false },
    });
    get_protection_mock(
        OWNER,
        REPO,
        "master",
        ResponseTemplate::new(200).set_body_json(source),
    )
    .mount(&server)
    .await;
    update_protection_mock(
        OWNER,
        REPO,
        "main",
        json!({
            "required_status_checks": { "strict": true, "contexts": ["ci/build"] },
            "enforce_admins": true,
            "required_pull_request_reviews": {
                "dismissal_restrictions": {
                    "users": ["octocat"],
                    "teams": ["maintainers"],
                    "apps": [],
                },
                "dismiss_stale_reviews": true,
                "require_code_owner_reviews": false,
                "required_approving_review_count": 1,
                "require_last_push_approval": false,
            },
            "restrictions": {
                "users": ["release-bot"],
                "teams": [],
                "apps": ["deployer"],
            },
            "required_linear_history": false,
            "allow_force_pushes": false,
            "allow_deletions": false,
        }),
    )
    .mount(&server)
    .await;
    let logs = CapturedLogs::new();

    let exit = run(&server, Command::UpdateDefault(InputArgs::default()), &logs).await;

    assert_eq!(exit, 0, "{}", logs.contents());
}

#[tokio::test]
async fn update_default_with_unprotected_base() {
    let server = MockServer::start().await;
    edit_repository_mock(OWNER, REPO, "main").mount(&server).await;
    get_protection_mock(
        OWNER,
        REPO,
        "master",
        ResponseTemplate::new(404).set_body_json(error_json("Branch not protected")),
    )
    .mount(&server)
    .await;
    let logs = CapturedLogs::new();

    let exit = run(&server, Command::UpdateDefault(InputArgs::default()), &logs).await;

    assert_eq!(exit, 0, "{}", logs.contents());
    assert!(logs.contents().contains("Branch has no protection, nothing to copy"));
}
