//! In-memory stand-ins for the forge and for git, used by the test suites.

pub mod provider;
pub mod vcs;

pub use provider::{pull_request, Call, MockProvider, MASTER_SHA, MOCK_OWNER, MOCK_REPO};
pub use vcs::{GitCall, MockVcs};
