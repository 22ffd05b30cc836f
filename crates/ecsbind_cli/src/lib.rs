//! The ecsbind command line tool
//!
//! Reads a workspace of symbol dumps, generates the ECS binding tables for it and publishes them
//! into the workspace's output directory.

use clap::Parser;
use ecsbind_utils::{ok, AnyResult, AnyhowResultExt};
use progress::ConsoleProgress;
use std::{io, path::PathBuf};

pub mod dump;
pub mod generate;
pub mod manifest;
pub mod progress;
pub mod toolchain;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Workspace manifest, or the directory containing `ecsbind.toml`
    pub workspace: PathBuf,
}

/// Runs `ecsbind` as if it was ran from the command line.
pub fn run(cli: Cli) -> AnyResult {
    let workspace = manifest::Workspace::load(&cli.workspace)
        .otherwise(format!("couldn't load workspace {}", cli.workspace.display()))?;
    println!("Loading workspace '{}'", cli.workspace.display());

    let stdin = io::stdin();
    generate::generate(&workspace, stdin.lock(), io::stdout(), &ConsoleProgress)?;
    ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_positional_argument() {
        let cli = Cli::try_parse_from(["ecsbind", "game/ecsbind.toml"]).unwrap();
        assert_eq!(cli.workspace, PathBuf::from("game/ecsbind.toml"));

        assert!(Cli::try_parse_from(["ecsbind"]).is_err());
        assert!(Cli::try_parse_from(["ecsbind", "a", "b"]).is_err());
    }
}
