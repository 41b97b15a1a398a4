pub mod common;
pub mod parser;
pub mod reader;

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::{error, Dispatch, Level};

pub use common::*;
pub use parser::{resolve, Config};
pub use reader::{read_config, read_config_file, FileConfig};

use crate::commands::{
    ClosePull, CreateBranches, DeleteBranches, MergePull, RewriteScope, UpdateDefault,
    UpdatePulls, UpdateReferences,
};
use crate::error::Error;
use crate::git::{GitCli, Vcs};
use crate::github_provider::GithubProvider;
use crate::logging;
use crate::provider::Provider;

/// Overrides the GitHub API root, e.g. for GitHub Enterprise.
pub const API_URL_ENV: &str = "MAINLINE_API_URL";

/// Moves a repository's default branch, e.g. from master to main.
#[derive(Debug, Parser)]
#[command(name = "mainline", version, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, PartialEq, Subcommand)]
pub enum Command {
    /// Create the target and temp branches off of the base branch
    #[command(name = "createBranches", alias = "create-branches")]
    CreateBranches(InputArgs),

    /// Replace references to the base branch across the repository and open a PR
    #[command(name = "updateRefs", alias = "update-refs")]
    UpdateRefs(InputArgs),

    /// Replace references to the base branch in CI configuration and open a PR
    #[command(name = "updateCI", alias = "update-ci")]
    UpdateCi(InputArgs),

    /// Retarget open PRs from the base branch to the target branch
    #[command(name = "updatePulls", alias = "update-pulls")]
    UpdatePulls(InputArgs),

    /// Make the target the default branch and copy the base's protection to it
    #[command(name = "updateDefault", alias = "update-default")]
    UpdateDefault(InputArgs),

    /// Remove protection from and delete the temp and base branches
    #[command(name = "deleteBranches", alias = "delete-branches")]
    DeleteBranches(InputArgs),

    /// Close a pull request
    #[command(name = "closePull", alias = "close-pull")]
    ClosePull {
        #[command(flatten)]
        inputs: InputArgs,

        /// Number of the pull request
        #[arg(long)]
        number: u64,
    },

    /// Squash-merge a pull request
    #[command(name = "mergePull", alias = "merge-pull")]
    MergePull {
        #[command(flatten)]
        inputs: InputArgs,

        /// Number of the pull request
        #[arg(long)]
        number: u64,
    },
}

impl Command {
    pub fn inputs(&self) -> &InputArgs {
        match self {
            Command::CreateBranches(inputs)
            | Command::UpdateRefs(inputs)
            | Command::UpdateCi(inputs)
            | Command::UpdatePulls(inputs)
            | Command::UpdateDefault(inputs)
            | Command::DeleteBranches(inputs)
            | Command::ClosePull { inputs, .. }
            | Command::MergePull { inputs, .. } => inputs,
        }
    }
}

/// What the arguments ask for, decided before anything touches the network.
#[derive(Debug)]
pub enum Invocation {
    /// Usage or version was printed, or the arguments did not parse.
    Exit(i32),
    Invalid { log_level: Level, error: Error },
    Run {
        command: Command,
        config: Config,
        log_level: Level,
    },
}

/// Parses `args` and layers the configuration, reading the environment through `env`.
pub fn prepare<I, T, E>(args: I, env: E) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    E: Fn(&str) -> Option<String>,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            // Printing to a closed stdout is not worth failing over.
            let _ = err.print();
            return Invocation::Exit(match err.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => 0,
                _ => 1,
            });
        }
    };

    let inputs = cli.command.inputs();
    let log_level = logging::level_for(inputs.verbose);

    let file = match inputs.config.as_deref().map(read_config_file).transpose() {
        Ok(file) => file,
        Err(err) => {
            return Invocation::Invalid {
                log_level,
                error: Error::Local(err),
            }
        }
    };

    match resolve(inputs, file, env) {
        Ok(config) => Invocation::Run {
            command: cli.command,
            config,
            log_level,
        },
        Err(error) => Invocation::Invalid { log_level, error },
    }
}

/// Runs one subcommand against `provider` and `vcs`, returning its exit code.
pub async fn dispatch<P: Provider, V: Vcs>(
    command: &Command,
    config: &Config,
    provider: &P,
    vcs: &V,
    logger: Dispatch,
) -> i32 {
    match command {
        Command::CreateBranches(_) => {
            let branches = vec![config.temp_branch.clone(), config.target.clone()];
            CreateBranches::new(config, provider, logger, branches)
                .run()
                .await
        }
        Command::UpdateRefs(_) => {
            UpdateReferences::new(config, provider, vcs, logger, RewriteScope::All)
                .run()
                .await
        }
        Command::UpdateCi(_) => {
            UpdateReferences::new(config, provider, vcs, logger, RewriteScope::Ci)
                .run()
                .await
        }
        Command::UpdatePulls(_) => UpdatePulls::new(config, provider, logger).run().await,
        Command::UpdateDefault(_) => UpdateDefault::new(config, provider, logger).run().await,
        Command::DeleteBranches(_) => {
            let branches = vec![config.temp_branch.clone(), config.base.clone()];
            DeleteBranches::new(config, provider, logger, branches)
                .run()
                .await
        }
        Command::ClosePull { number, .. } => {
            ClosePull::new(config, provider, logger, *number).run().await
        }
        Command::MergePull { number, .. } => {
            MergePull::new(config, provider, logger, *number).run().await
        }
    }
}

fn report(logger: &Dispatch, err: &Error) {
    tracing::dispatcher::with_default(logger, || error!("{err}"));
}

/// Entry point of the binary: parses `args`, reads the process environment,
/// talks to GitHub and the local `git`.
pub async fn run<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let env = |key: &str| std::env::var(key).ok();

    let (command, config, log_level) = match prepare(args, env) {
        Invocation::Exit(code) => return code,
        Invocation::Invalid { log_level, error } => {
            report(&logging::logger(log_level), &error);
            return 1;
        }
        Invocation::Run {
            command,
            config,
            log_level,
        } => (command, config, log_level),
    };

    let logger = logging::logger(log_level);
    let api_url = env(API_URL_ENV).filter(|url| !url.is_empty());
    let provider = match GithubProvider::configure(&config.token, api_url) {
        Ok(provider) => provider,
        Err(err) => {
            report(&logger, &err);
            return 1;
        }
    };

    dispatch(&command, &config, &provider, &GitCli::default(), logger).await
}
