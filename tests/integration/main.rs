mod commands;
mod github_provider;

mod mocks {
    pub mod github;
}
