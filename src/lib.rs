//! Moves a GitHub repository's default branch to a new name: creates the new
//! branch, rewrites references, retargets pull requests, flips the default,
//! copies branch protection and removes the old branch.

pub mod cli;
pub mod commands;
pub mod error;
pub mod fixtures;
pub mod git;
pub mod github_provider;
pub mod logging;
pub mod mocks;
pub mod models;
pub mod provider;
pub mod rewrite;

pub use error::{Error, ForgeError, Result};
