//! Local working copies: shallow clone, commit and push through the `git` binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::process::Command;

/// The forge ignores the username for token auth, but git refuses an empty one.
const GIT_USERNAME: &str = "x-access-token";

/// Upper bound for a single git invocation, clone and push included.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Where a working copy is cloned from and pushed back to.
#[derive(Clone)]
pub struct RemoteRepository {
    pub url: String,
    token: String,
}

impl RemoteRepository {
    pub fn new(url: &str, token: &str) -> Self {
        RemoteRepository {
            url: url.to_string(),
            token: token.to_string(),
        }
    }

    pub fn github(owner: &str, repo: &str, token: &str) -> Self {
        Self::new(&format!("https://github.com/{owner}/{repo}.git"), token)
    }

    fn auth_header(&self) -> String {
        let credentials = STANDARD.encode(format!("{GIT_USERNAME}:{}", self.token));
        format!("http.extraHeader=AUTHORIZATION: basic {credentials}")
    }
}

impl std::fmt::Debug for RemoteRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteRepository")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

#[async_trait]
pub trait Vcs: Send + Sync {
    /// Clones `branch` of `remote` into the empty directory `dir`, returning the HEAD sha.
    async fn clone_branch(&self, remote: &RemoteRepository, branch: &str, dir: &Path)
        -> Result<String>;

    /// Stages every change under `dir` and commits it, returning the new sha.
    async fn commit_all(&self, dir: &Path, message: &str, author: &Signature) -> Result<String>;

    async fn push(&self, remote: &RemoteRepository, dir: &Path, branch: &str) -> Result<()>;
}

/// [`Vcs`] that shells out to the `git` found on `PATH`.
pub struct GitCli {
    program: String,
    timeout: Duration,
}

impl Default for GitCli {
    fn default() -> Self {
        GitCli {
            program: "git".to_string(),
            timeout: GIT_TIMEOUT,
        }
    }
}

impl GitCli {
    async fn git(&self, dir: Option<&Path>, args: &[&str], what: &str) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(output) => output.with_context(|| format!("failed to execute git {what}"))?,
            Err(_) => anyhow::bail!("git {what} timed out after {:?}", self.timeout),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git {what} failed: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn head(&self, dir: &Path) -> Result<String> {
        self.git(Some(dir), &["rev-parse", "HEAD"], "rev-parse").await
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn clone_branch(
        &self,
        remote: &RemoteRepository,
        branch: &str,
        dir: &Path,
    ) -> Result<String> {
        let header = remote.auth_header();
        let target = dir.to_string_lossy().into_owned();
        self.git(
            None,
            &[
                "-c",
                &header,
                "clone",
                "--quiet",
                "--depth",
                "1",
                "--single-branch",
                "--branch",
                branch,
                &remote.url,
                &target,
            ],
            "clone",
        )
        .await
        .with_context(|| format!("failed to clone {} at {branch}", remote.url))?;

        self.head(dir).await
    }

    async fn commit_all(&self, dir: &Path, message: &str, author: &Signature) -> Result<String> {
        self.git(Some(dir), &["add", "--all"], "add").await?;

        let name = format!("user.name={}", author.name);
        let email = format!("user.email={}", author.email);
        self.git(
            Some(dir),
            &["-c", &name, "-c", &email, "commit", "--quiet", "-m", message],
            "commit",
        )
        .await?;

        self.head(dir).await
    }

    async fn push(&self, remote: &RemoteRepository, dir: &Path, branch: &str) -> Result<()> {
        let header = remote.auth_header();
        let refspec = format!("HEAD:refs/heads/{branch}");
        self.git(
            Some(dir),
            &["-c", &header, "push", "--quiet", &remote.url, &refspec],
            "push",
        )
        .await
        .with_context(|| format!("failed to push to {branch}"))?;

        Ok(())
    }
}
