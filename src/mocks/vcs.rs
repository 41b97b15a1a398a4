use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::git::{RemoteRepository, Signature, Vcs};

pub const HEAD_SHA: &str = "9f2c1a7d5be1c0a3b4e6f8d2a1c3e5f7b9d0a2c4";

#[derive(Clone, Debug, PartialEq)]
pub enum GitCall {
    Clone { url: String, branch: String },
    Commit { message: String, author: Signature },
    Push { url: String, branch: String },
}

#[derive(Default)]
struct State {
    remote: BTreeMap<String, String>,
    staged: Option<BTreeMap<String, String>>,
    calls: Vec<GitCall>,
}

/// [`Vcs`] over an in-memory remote holding one branch's files.
///
/// A clone writes the files into the working directory, a commit snapshots the
/// directory, and a push replaces the remote files with that snapshot, so a
/// second run sees the result of the first.
#[derive(Default)]
pub struct MockVcs {
    state: Mutex<State>,
}

impl MockVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.state
            .lock()
            .remote
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.state.lock().calls.clone()
    }

    pub fn remote_file(&self, path: &str) -> Option<String> {
        self.state.lock().remote.get(path).cloned()
    }

    pub fn commits(&self) -> usize {
        self.count(|call| matches!(call, GitCall::Commit { .. }))
    }

    pub fn pushes(&self) -> usize {
        self.count(|call| matches!(call, GitCall::Push { .. }))
    }

    fn count(&self, predicate: impl Fn(&GitCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }
}

fn snapshot(root: &Path) -> Result<BTreeMap<String, String>> {
    let mut files = BTreeMap::new();
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).with_context(|| format!("failed to read {dir:?}"))? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let relative = path
                .strip_prefix(root)
                .context("file outside working copy")?
                .to_string_lossy()
                .replace('\\', "/");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {path:?}"))?;
            files.insert(relative, content);
        }
    }

    Ok(files)
}

#[async_trait]
impl Vcs for MockVcs {
    async fn clone_branch(
        &self,
        remote: &RemoteRepository,
        branch: &str,
        dir: &Path,
    ) -> Result<String> {
        let files = {
            let mut state = self.state.lock();
            state.calls.push(GitCall::Clone {
                url: remote.url.clone(),
                branch: branch.to_string(),
            });
            state.remote.clone()
        };

        for (path, content) in files {
            let target = dir.join(&path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, content)?;
        }

        Ok(HEAD_SHA.to_string())
    }

    async fn commit_all(&self, dir: &Path, message: &str, author: &Signature) -> Result<String> {
        let files = snapshot(dir)?;
        let mut state = self.state.lock();
        state.calls.push(GitCall::Commit {
            message: message.to_string(),
            author: author.clone(),
        });
        state.staged = Some(files);

        Ok("0d1e2f3a4b5c6d7e8f9a0b1c2d3e4f5a6b7c8d9e".to_string())
    }

    async fn push(&self, remote: &RemoteRepository, _dir: &Path, branch: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(GitCall::Push {
            url: remote.url.clone(),
            branch: branch.to_string(),
        });
        let staged = state.staged.take().context("nothing committed to push")?;
        state.remote = staged;

        Ok(())
    }
}
