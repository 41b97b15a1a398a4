use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

pub fn ref_json(branch: &str, sha: &str) -> Value {
    json!({
        "ref": format!("refs/heads/{branch}"),
        "node_id": "REF_kwDOAbc",
        "url": format!("https://api.github.com/repos/octo-org/test/git/refs/heads/{branch}"),
        "object": {
            "sha": sha,
            "type": "commit",
            "url": format!("https://api.github.com/repos/octo-org/test/git/commits/{sha}"),
        },
    })
}

pub fn pull_json(owner: &str, repo: &str, number: u64, base: &str) -> Value {
    json!({
        "number": number,
        "url": format!("https://api.github.com/repos/{owner}/{repo}/pulls/{number}"),
        "html_url": format!("https://github.com/{owner}/{repo}/pull/{number}"),
        "title": format!("Change #{number}"),
        "state": "open",
        "base": {
            "ref": base,
            "label": format!("{owner}:{base}"),
        },
    })
}

pub fn error_json(message: &str) -> Value {
    json!({
        "message": message,
        "documentation_url": "https://docs.github.com/rest",
    })
}

pub fn get_ref_mock(owner: &str, repo: &str, branch: &str, sha: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{owner}/{repo}/git/ref/heads/{branch}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(ref_json(branch, sha)))
        .expect(1)
}

pub fn missing_ref_mock(owner: &str, repo: &str, branch: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{owner}/{repo}/git/ref/heads/{branch}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_json("Not Found")))
        .expect(1)
}

pub fn create_ref_mock(owner: &str, repo: &str, branch: &str, sha: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path(format!("/repos/{owner}/{repo}/git/refs")))
        .and(body_json(json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": sha,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(ref_json(branch, sha)))
        .expect(1)
}

pub fn delete_ref_mock(owner: &str, repo: &str, branch: &str) -> Mock {
    Mock::given(method("DELETE"))
        .and(path(format!("/repos/{owner}/{repo}/git/refs/heads/{branch}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
}

pub fn edit_repository_mock(owner: &str, repo: &str, default_branch: &str) -> Mock {
    Mock::given(method("PATCH"))
        .and(path(format!("/repos/{owner}/{repo}")))
        .and(body_json(json!({ "default_branch": default_branch })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1296269,
            "name": repo,
            "full_name": format!("{owner}/{repo}"),
            "default_branch": default_branch,
            "html_url": format!("https://github.com/{owner}/{repo}"),
        })))
        .expect(1)
}

pub fn get_protection_mock(owner: &str, repo: &str, branch: &str, response: ResponseTemplate) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{owner}/{repo}/branches/{branch}/protection")))
        .respond_with(response)
        .expect(1)
}

pub fn update_protection_mock(owner: &str, repo: &str, branch: &str, expected: Value) -> Mock {
    Mock::given(method("PUT"))
        .and(path(format!("/repos/{owner}/{repo}/branches/{branch}/protection")))
        .and(body_json(expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": format!("https://api.github.com/repos/{owner}/{repo}/branches/{branch}/protection"),
        })))
        .expect(1)
}

pub fn remove_protection_mock(owner: &str, repo: &str, branch: &str, status: u16) -> Mock {
    let response = match status {
        204 => ResponseTemplate::new(204),
        other => ResponseTemplate::new(other).set_body_json(error_json("Branch not protected")),
    };

    Mock::given(method("DELETE"))
        .and(path(format!("/repos/{owner}/{repo}/branches/{branch}/protection")))
        .respond_with(response)
        .expect(1)
}

/// One page of open pulls against `base`. `next` is the absolute URL of the
/// following page, if any.
pub fn list_pulls_mock(
    owner: &str,
    repo: &str,
    base: &str,
    page: u32,
    pulls: Vec<Value>,
    next: Option<String>,
) -> Mock {
    let mut response = ResponseTemplate::new(200).set_body_json(Value::Array(pulls));
    if let Some(next) = next {
        response = response.insert_header("Link", format!("<{next}>; rel=\"next\"").as_str());
    }

    Mock::given(method("GET"))
        .and(path(format!("/repos/{owner}/{repo}/pulls")))
        .and(query_param("state", "open"))
        .and(query_param("base", base))
        .and(query_param("page", page.to_string()))
        .respond_with(response)
        .expect(1)
}

pub fn edit_pull_mock(owner: &str, repo: &str, number: u64, expected: Value, response: ResponseTemplate) -> Mock {
    Mock::given(method("PATCH"))
        .and(path(format!("/repos/{owner}/{repo}/pulls/{number}")))
        .and(body_json(expected))
        .respond_with(response)
        .expect(1)
}

pub fn merge_pull_mock(owner: &str, repo: &str, number: u64, response: Value) -> Mock {
    Mock::given(method("PUT"))
        .and(path(format!("/repos/{owner}/{repo}/pulls/{number}/merge")))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .expect(1)
}
