use crate::cli::Config;
use crate::mocks::{MOCK_OWNER, MOCK_REPO};

pub fn get_config() -> Config {
    Config {
        owner: MOCK_OWNER.to_string(),
        repo: MOCK_REPO.to_string(),
        base: "master".to_string(),
        target: "main".to_string(),
        token: "token".to_string(),
        exclusion: vec![".git/".to_string(), "go.mod".to_string(), "go.sum".to_string()],
        temp_branch: "update-references".to_string(),
    }
}
