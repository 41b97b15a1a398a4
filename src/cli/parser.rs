use std::fmt;

use super::{
    common::{
        InputArgs, ALWAYS_EXCLUDED, DEFAULT_BASE, DEFAULT_TARGET, DEFAULT_TEMP_BRANCH, ENV_PREFIX,
    },
    reader::FileConfig,
};
use crate::error::Error;

/// Run parameters, fixed for the whole invocation.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub owner: String,
    pub repo: String,
    pub base: String,
    pub target: String,
    pub token: String,
    pub exclusion: Vec<String>,
    pub temp_branch: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("base", &self.base)
            .field("target", &self.target)
            .field("token", &"<redacted>")
            .field("exclusion", &self.exclusion)
            .field("temp_branch", &self.temp_branch)
            .finish()
    }
}

impl Config {
    /// Exclusions the user asked for, without the built-in ones.
    pub fn user_exclusions(&self) -> Vec<&str> {
        self.exclusion
            .iter()
            .map(String::as_str)
            .filter(|path| !ALWAYS_EXCLUDED.contains(path))
            .collect()
    }
}

fn env_name(key: &str) -> String {
    format!("{ENV_PREFIX}_{}", key.to_uppercase())
}

/// Layers defaults, the config file, flags and environment, in that order:
/// the environment is applied last, so it wins over a flag.
pub fn resolve<E>(args: &InputArgs, file: Option<FileConfig>, env: E) -> Result<Config, Error>
where
    E: Fn(&str) -> Option<String>,
{
    let file = file.unwrap_or_default();
    let from_env = |key: &str| env(&env_name(key)).filter(|value| !value.is_empty());

    // Only an empty env value counts as unset; an empty flag or file value is kept.
    let pick = |key: &str, flag: &Option<String>, file: Option<String>| -> Option<String> {
        from_env(key).or_else(|| flag.clone()).or(file)
    };
    let required = |key: &str, flag: &Option<String>, file: Option<String>| -> Option<String> {
        pick(key, flag, file).filter(|value| !value.trim().is_empty())
    };

    let owner = required("owner", &args.owner, file.owner);
    let repo = required("repo", &args.repo, file.repo);
    let token = required("token", &args.token, file.token);
    let base = pick("base", &args.base, file.base).unwrap_or_else(|| DEFAULT_BASE.to_string());
    let target =
        pick("target", &args.target, file.target).unwrap_or_else(|| DEFAULT_TARGET.to_string());
    let temp_branch = pick("temp_branch", &args.temp_branch, file.temp_branch)
        .unwrap_or_else(|| DEFAULT_TEMP_BRANCH.to_string());

    let exclusion = match from_env("exclusion").or_else(|| args.exclusion.clone()) {
        Some(list) => parse_exclusion(&list),
        None => file.exclusion.unwrap_or_default(),
    };

    let mut missing = Vec::new();
    if owner.is_none() {
        missing.push("owner");
    }
    if repo.is_none() {
        missing.push("repo");
    }
    if token.is_none() {
        missing.push("token");
    }
    let (Some(owner), Some(repo), Some(token)) = (owner, repo, token) else {
        return Err(Error::MissingInputs(missing));
    };

    for (name, value) in [("base", &base), ("target", &target), ("temp branch", &temp_branch)] {
        if value.trim().is_empty() {
            return Err(Error::Config(format!("{name} must not be empty")));
        }
    }
    if base == target {
        return Err(Error::Config(format!(
            "base and target are both '{base}', nothing to migrate"
        )));
    }
    if temp_branch == base || temp_branch == target {
        return Err(Error::Config(format!(
            "temp branch '{temp_branch}' must differ from base and target"
        )));
    }

    Ok(Config {
        owner,
        repo,
        base,
        target,
        token,
        exclusion: with_default_exclusions(exclusion),
        temp_branch,
    })
}

/// Splits a comma-separated list, dropping blank elements.
fn parse_exclusion(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

fn with_default_exclusions(mut exclusion: Vec<String>) -> Vec<String> {
    exclusion.retain(|path| !path.trim().is_empty());
    for path in ALWAYS_EXCLUDED {
        if !exclusion.iter().any(|existing| existing == path) {
            exclusion.push(path.to_string());
        }
    }
    exclusion
}
