use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::application::data::LogLevel;
use crate::path::Path;

/// Seeds an in-memory storage, pulls documents into a cache, stages local
/// changes and optionally pushes them back.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// YAML file with the initial storage snapshot
    pub seed: PathBuf,

    /// Pull the document at PATH into the cache
    #[clap(long = "pull", value_name = "PATH")]
    pub pulls: Vec<Path>,

    /// Edit a pulled document
    #[clap(long = "edit", value_name = "PATH=DOCUMENT", value_parser = parse_assignment)]
    pub edits: Vec<Assignment>,

    /// Mark a pulled document as deleted
    #[clap(long = "delete", value_name = "PATH")]
    pub deletes: Vec<Path>,

    /// Stage a new subdocument under a pulled document
    #[clap(long = "add", value_name = "PATH=DOCUMENT", value_parser = parse_assignment)]
    pub additions: Vec<Assignment>,

    /// Drop staged edits and deletions before pushing
    #[clap(long)]
    pub discard: bool,

    /// Commit staged changes to storage and re-pull what they affected
    #[clap(long)]
    pub push: bool,

    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    #[clap(long, default_value = "auto", value_enum)]
    pub color: ColorChoice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub path: Path,
    pub document: String,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

fn parse_assignment(input: &str) -> Result<Assignment, String> {
    let (path, document) = input
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=DOCUMENT, got '{input}'"))?;
    let path = path.parse::<Path>().map_err(|err| err.to_string())?;
    Ok(Assignment {
        path,
        document: document.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "docmirror",
            "seed.yaml",
            "--pull",
            "/1/0",
            "--pull",
            "/0",
            "--edit",
            "/1/0=B0 = edited",
            "--add",
            "/0=new",
            "--delete",
            "/0",
            "--push",
            "-l",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.seed, PathBuf::from("seed.yaml"));
        assert_eq!(cli.pulls.len(), 2);
        assert_eq!(cli.edits[0].document, "B0 = edited");
        assert_eq!(cli.edits[0].path.to_string(), "/1/0");
        assert_eq!(cli.additions[0].document, "new");
        assert_eq!(cli.deletes[0].to_string(), "/0");
        assert!(cli.push);
        assert!(!cli.discard);
        assert_eq!(cli.color, ColorChoice::Auto);
    }

    #[rstest]
    #[case(&["docmirror", "seed.yaml", "--pull", "1/0"])]
    #[case(&["docmirror", "seed.yaml", "--edit", "/1/0"])]
    #[case(&["docmirror", "seed.yaml", "--add", "/x=doc"])]
    #[case(&["docmirror"])]
    fn rejects_bad_arguments(#[case] args: &[&str]) {
        assert!(Cli::try_parse_from(args.iter().copied()).is_err());
    }
}
