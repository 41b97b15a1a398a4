use std::path::PathBuf;

use clap::Args;

pub const ENV_PREFIX: &str = "MAINLINE";
pub const DEFAULT_BASE: &str = "master";
pub const DEFAULT_TARGET: &str = "main";
pub const DEFAULT_TEMP_BRANCH: &str = "update-references";

/// Paths never rewritten, whatever the user excludes.
pub const ALWAYS_EXCLUDED: &[&str] = &[".git/", "go.mod", "go.sum"];

/// Flags shared by every subcommand. Each one can also be set through a
/// `MAINLINE_<NAME>` environment variable, which takes precedence.
#[derive(Args, Clone, Debug, Default, PartialEq)]
pub struct InputArgs {
    /// The GitHub org that owns the repo, e.g. 'hashicorp'
    #[arg(long)]
    pub owner: Option<String>,

    /// The repository name, e.g. 'circle-codesign'
    #[arg(long)]
    pub repo: Option<String>,

    /// Your personal GitHub access token
    #[arg(long)]
    pub token: Option<String>,

    /// The name of the current base branch [default: master]
    #[arg(long)]
    pub base: Option<String>,

    /// The name of the target branch [default: main]
    #[arg(long)]
    pub target: Option<String>,

    /// Paths to exclude from reference updates, e.g. '.circleci/config.yml,.teamcity.yml'
    #[arg(long)]
    pub exclusion: Option<String>,

    /// Working branch that carries the reference updates [default: update-references]
    #[arg(long)]
    pub temp_branch: Option<String>,

    /// YAML file providing any of the values above
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
