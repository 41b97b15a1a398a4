//! Find-and-replace of the base branch name over a cloned working tree.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_recursion::async_recursion;
use regex::RegexSet;
use tokio::fs;
use tracing::{debug, info};

/// Top-level entries holding CI configuration.
pub const CI_PATHS: &[&str] = &[
    ".circleci",
    ".github",
    ".teamcity",
    ".travis.yml",
    ".gitlab-ci.yml",
];

/// Hosts that show up in module paths. A line naming one of them is taken to
/// be a dependency import and is left untouched.
const MODULE_HOSTS: &[&str] = &[
    r"github\.com/",
    r"gitlab\.com/",
    r"bitbucket\.org/",
    r"golang\.org/",
    r"gopkg\.in/",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewriteScope {
    /// Every file in the tree, except lines that look like imports.
    All,
    /// YAML files under [`CI_PATHS`] only.
    Ci,
}

/// Replaces `from` with `to` on every line not matched by `imports`.
///
/// An occurrence of `from` that already sits inside a `to` is left alone, so
/// running it again over its own output changes nothing even when `to`
/// contains `from`. Returns `None` when nothing changed. Line endings are kept
/// as they are.
pub fn rewrite_content(
    content: &str,
    from: &str,
    to: &str,
    imports: Option<&RegexSet>,
) -> Option<String> {
    if from.is_empty() {
        return None;
    }
    // Offsets at which `from` shows up inside `to`.
    let inner: Vec<usize> = to.match_indices(from).map(|(offset, _)| offset).collect();
    let mut changed = false;

    let lines: Vec<Cow<'_, str>> = content
        .split('\n')
        .map(|line| {
            let is_import = imports.is_some_and(|set| set.is_match(line));
            if is_import {
                return Cow::Borrowed(line);
            }
            match replace_line(line, from, to, &inner) {
                Some(updated) => {
                    changed = true;
                    Cow::Owned(updated)
                }
                None => Cow::Borrowed(line),
            }
        })
        .collect();

    changed.then(|| lines.join("\n"))
}

fn replace_line(line: &str, from: &str, to: &str, inner: &[usize]) -> Option<String> {
    let mut updated = String::with_capacity(line.len());
    let mut copied = 0;

    for (start, _) in line.match_indices(from) {
        let migrated = inner.iter().any(|&offset| {
            start >= offset
                && line
                    .get(start - offset..)
                    .is_some_and(|rest| rest.starts_with(to))
        });
        if migrated {
            continue;
        }
        updated.push_str(&line[copied..start]);
        updated.push_str(to);
        copied = start + from.len();
    }

    if copied == 0 {
        return None;
    }
    updated.push_str(&line[copied..]);
    Some(updated)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// Path of `path` relative to `root` with `/` separators; directories end in `/`.
fn relative_name(root: &Path, path: &Path, is_dir: bool) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut name = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if is_dir {
        name.push('/');
    }
    name
}

pub struct Rewriter {
    from: String,
    to: String,
    exclusion: Vec<String>,
    scope: RewriteScope,
    imports: Option<RegexSet>,
}

impl Rewriter {
    pub fn new(from: &str, to: &str, exclusion: &[String], scope: RewriteScope) -> Result<Self> {
        let imports = match scope {
            RewriteScope::All => {
                Some(RegexSet::new(MODULE_HOSTS).context("invalid module host pattern")?)
            }
            RewriteScope::Ci => None,
        };

        Ok(Rewriter {
            from: from.to_string(),
            to: to.to_string(),
            exclusion: exclusion.to_vec(),
            scope,
            imports,
        })
    }

    fn is_excluded(&self, relative: &str) -> bool {
        self.exclusion
            .iter()
            .any(|excluded| relative.contains(excluded.as_str()))
    }

    /// Rewrites the tree under `root`, returning the changed files relative to it.
    pub async fn run(&self, root: &Path) -> Result<Vec<String>> {
        info!(
            base = %self.from,
            target = %self.to,
            "Finding and replacing all references from base to target"
        );
        let mut changed = Vec::new();

        match self.scope {
            RewriteScope::All => self.walk(root, root, &mut changed).await?,
            RewriteScope::Ci => {
                for entry in CI_PATHS {
                    let path = root.join(entry);
                    match fs::symlink_metadata(&path).await {
                        Ok(meta) => self.visit(root, path, meta.file_type(), &mut changed).await?,
                        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                            debug!(path = %entry, "No CI configuration here");
                        }
                        Err(err) => {
                            return Err(err).with_context(|| format!("failed to stat {entry}"))
                        }
                    }
                }
            }
        }

        Ok(changed)
    }

    #[async_recursion]
    async fn walk(&self, root: &Path, dir: &Path, changed: &mut Vec<String>) -> Result<()> {
        let mut reader = fs::read_dir(dir)
            .await
            .with_context(|| format!("failed to read directory {}", dir.display()))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            entries.push((entry.path(), entry.file_type().await?));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (path, kind) in entries {
            self.visit(root, path, kind, changed).await?;
        }

        Ok(())
    }

    async fn visit(
        &self,
        root: &Path,
        path: PathBuf,
        kind: std::fs::FileType,
        changed: &mut Vec<String>,
    ) -> Result<()> {
        if kind.is_symlink() {
            return Ok(());
        }

        let relative = relative_name(root, &path, kind.is_dir());
        if self.is_excluded(&relative) {
            debug!(path = %relative, "Skipping excluded path");
            return Ok(());
        }

        if kind.is_dir() {
            return self.walk(root, &path, changed).await;
        }

        if self.scope == RewriteScope::Ci && !is_yaml(&path) {
            return Ok(());
        }

        if self.rewrite_file(&path).await? {
            info!(path = %relative, "Updated the file");
            changed.push(relative);
        }

        Ok(())
    }

    async fn rewrite_file(&self, path: &Path) -> Result<bool> {
        let bytes = fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        let Ok(content) = String::from_utf8(bytes) else {
            debug!(path = %path.display(), "Skipping file that is not UTF-8");
            return Ok(false);
        };

        match rewrite_content(&content, &self.from, &self.to, self.imports.as_ref()) {
            Some(updated) => {
                fs::write(path, updated)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
