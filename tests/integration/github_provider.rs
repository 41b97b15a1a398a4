use mainline::error::ForgeError;
use mainline::github_provider::GithubProvider;
use mainline::models::{
    GitRef, ListPulls, MergeMethod, MergeRequest, NewRef, PullRequestEdit, PullState,
};
use mainline::provider::{GitRefs, PullRequests, Repositories};
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};

use crate::mocks::github::{
    create_ref_mock, delete_ref_mock, edit_pull_mock, edit_repository_mock, error_json,
    get_protection_mock, get_ref_mock, list_pulls_mock, merge_pull_mock, missing_ref_mock,
    pull_json, remove_protection_mock,
};

const OWNER: &str = "octo-org";
const REPO: &str = "test";
const SHA: &str = "aa218f56b14c9653891f9e74264a383fa43fefbd";

fn provider(server: &MockServer) -> GithubProvider {
    GithubProvider::configure("token", Some(server.uri())).unwrap()
}

mod refs {
    use super::*;

    #[tokio::test]
    async fn get_ref_reads_the_head_sha() {
        let server = MockServer::start().await;
        get_ref_mock(OWNER, REPO, "master", SHA).mount(&server).await;

        let git_ref: GitRef = provider(&server).get_ref(OWNER, REPO, "master").await.unwrap();

        assert_eq!(git_ref.name, "refs/heads/master");
        assert_eq!(git_ref.object.sha, SHA);
    }

    #[tokio::test]
    async fn missing_ref_is_not_found() {
        let server = MockServer::start().await;
        missing_ref_mock(OWNER, REPO, "trunk").mount(&server).await;

        let err = provider(&server).get_ref(OWNER, REPO, "trunk").await.unwrap_err();

        assert!(err.is_not_found(), "{err:?}");
    }

    #[tokio::test]
    async fn create_ref_posts_the_full_ref_name() {
        let server = MockServer::start().await;
        create_ref_mock(OWNER, REPO, "main", SHA).mount(&server).await;

        let created = provider(&server)
            .create_ref(OWNER, REPO, &NewRef::branch("main", SHA))
            .await
            .unwrap();

        assert_eq!(created.name, "refs/heads/main");
    }

    #[tokio::test]
    async fn delete_ref_accepts_an_empty_response() {
        let server = MockServer::start().await;
        delete_ref_mock(OWNER, REPO, "master").mount(&server).await;

        provider(&server).delete_ref(OWNER, REPO, "master").await.unwrap();
    }
}

mod repository {
    use super::*;

    #[tokio::test]
    async fn set_default_branch_returns_the_new_default() {
        let server = MockServer::start().await;
        edit_repository_mock(OWNER, REPO, "main").mount(&server).await;

        let repository = provider(&server)
            .set_default_branch(OWNER, REPO, "main")
            .await
            .unwrap();

        assert_eq!(repository.default_branch.as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn protection_is_read_with_its_optional_groups() {
        let server = MockServer::start().await;
        let body = json!({
            "url": "https://api.github.com/repos/octo-org/test/branches/master/protection",
            "required_status_checks": {
                "strict": true,
                "contexts": ["ci/build"],
                "checks": [{ "context": "ci/build", "app_id": null }],
            },
            "enforce_admins": { "url": "https://api.github.com/x", "enabled": false },
        });
        get_protection_mock(OWNER, REPO, "master", ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let protection = provider(&server)
            .get_branch_protection(OWNER, REPO, "master")
            .await
            .unwrap();

        assert_eq!(
            protection.required_status_checks.unwrap().contexts,
            vec!["ci/build".to_string()]
        );
        assert_eq!(protection.enforce_admins.map(|t| t.enabled), Some(false));
        assert_eq!(protection.required_pull_request_reviews, None);
        assert_eq!(protection.restrictions, None);
    }

    #[tokio::test]
    async fn unprotected_branch_is_not_found() {
        let server = MockServer::start().await;
        get_protection_mock(
            OWNER,
            REPO,
            "master",
            ResponseTemplate::new(404).set_body_json(error_json("Branch not protected")),
        )
        .mount(&server)
        .await;

        let err = provider(&server)
            .get_branch_protection(OWNER, REPO, "master")
            .await
            .unwrap_err();

        match err {
            ForgeError::NotFound(message) => assert_eq!(message, "Branch not protected"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn remove_protection_surfaces_api_errors() {
        let server = MockServer::start().await;
        remove_protection_mock(OWNER, REPO, "master", 403).mount(&server).await;

        let err = provider(&server)
            .remove_branch_protection(OWNER, REPO, "master")
            .await
            .unwrap_err();

        assert!(matches!(err, ForgeError::Api { status: 403, .. }), "{err:?}");
    }
}

mod pulls {
    use super::*;

    #[tokio::test]
    async fn list_reports_the_next_page_from_the_link_header() {
        let server = MockServer::start().await;
        let next = format!(
            "{}/repos/{OWNER}/{REPO}/pulls?state=open&base=master&per_page=1&page=2",
            server.uri()
        );
        list_pulls_mock(OWNER, REPO, "master", 1, vec![pull_json(OWNER, REPO, 1, "master")], Some(next))
            .mount(&server)
            .await;
        list_pulls_mock(OWNER, REPO, "master", 2, vec![pull_json(OWNER, REPO, 2, "master")], None)
            .mount(&server)
            .await;

        let github = provider(&server);
        let mut params = ListPulls {
            state: PullState::Open,
            base: "master".to_string(),
            per_page: 1,
            page: 1,
        };
        let first = github.list_pulls(OWNER, REPO, &params).await.unwrap();
        params.page = 2;
        let second = github.list_pulls(OWNER, REPO, &params).await.unwrap();

        assert_eq!(first.items[0].number, 1);
        assert_eq!(first.next_page, Some(2));
        assert_eq!(second.items[0].number, 2);
        assert_eq!(second.next_page, None);
    }

    #[tokio::test]
    async fn edit_sends_only_the_changed_fields() {
        let server = MockServer::start().await;
        edit_pull_mock(
            OWNER,
            REPO,
            7,
            json!({ "base": "main" }),
            ResponseTemplate::new(200).set_body_json(pull_json(OWNER, REPO, 7, "main")),
        )
        .mount(&server)
        .await;

        let edit = PullRequestEdit {
            base: Some("main".to_string()),
            state: None,
        };
        let pull = provider(&server).edit_pull(OWNER, REPO, 7, &edit).await.unwrap();

        assert_eq!(pull.base.ref_name, "main");
    }

    #[tokio::test]
    async fn merge_reports_an_unmerged_result() {
        let server = MockServer::start().await;
        merge_pull_mock(
            OWNER,
            REPO,
            7,
            json!({ "sha": null, "merged": false, "message": "Head branch was modified" }),
        )
        .mount(&server)
        .await;

        let request = MergeRequest {
            commit_title: "Update references from master to main".to_string(),
            merge_method: MergeMethod::Squash,
        };
        let result = provider(&server).merge_pull(OWNER, REPO, 7, &request).await.unwrap();

        assert!(!result.merged);
        assert_eq!(result.message, "Head branch was modified");
    }
}
