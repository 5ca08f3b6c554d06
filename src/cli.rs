// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `changelink`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "changelink",
    version,
    about = "Notify owners when watched lines of a file change in a diff.",
    long_about = None
)]
#[command(group(
    ArgGroup::new("diff_input")
        .args(["diff_file", "run_git", "base"])
        .multiple(false)
))]
pub struct CliArgs {
    /// Path to the config document (TOML, YAML, JSON or MessagePack).
    #[arg(long, short = 'c', value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Read the unified diff from this file instead of stdin.
    #[arg(long, value_name = "PATH")]
    pub diff_file: Option<PathBuf>,

    /// Take the diff from `git diff` in the current directory.
    #[arg(long, short = 'g')]
    pub run_git: bool,

    /// Fetch `origin/<BRANCH>` and diff the working tree against it.
    #[arg(long, value_name = "BRANCH")]
    pub base: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CHANGELINK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Evaluate watchers and print what would trigger, without performing
    /// any action.
    #[arg(long)]
    pub dry_run: bool,
}

/// Where the diff comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffInput {
    Stdin,
    File(PathBuf),
    /// `git diff` against the index.
    GitWorkingTree,
    /// `git fetch origin <branch>` then `git diff origin/<branch>`.
    GitBranch(String),
}

impl CliArgs {
    pub fn diff_input(&self) -> DiffInput {
        if let Some(path) = &self.diff_file {
            DiffInput::File(path.clone())
        } else if let Some(branch) = &self.base {
            DiffInput::GitBranch(branch.clone())
        } else if self.run_git {
            DiffInput::GitWorkingTree
        } else {
            DiffInput::Stdin
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
