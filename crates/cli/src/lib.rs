mod identifier;
mod resolve;
mod resolvers;
mod split;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "assetres",
    version,
    about = "Inspect how asset paths are dispatched and resolved",
    long_about = "assetres routes asset paths to the primary resolver, URI resolvers selected by \
                  scheme, and package resolvers selected by extension. These commands run the \
                  process-wide resolver configured from ASSETRES_* environment variables."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve an asset path
    Resolve {
        #[arg(value_name = "ASSET_PATH")]
        path: String,
        /// Search path bound for the default resolver (repeatable)
        #[arg(long = "search-path", value_name = "DIR")]
        search_paths: Vec<PathBuf>,
        /// Context built by the resolver for SCHEME, as SCHEME=STRING.
        /// An empty scheme targets the primary resolver.
        #[arg(long = "context", value_name = "SCHEME=STRING", value_parser = parse_context)]
        contexts: Vec<(String, String)>,
    },
    /// Create an identifier, optionally anchored to a resolved path
    Identifier {
        #[arg(value_name = "ASSET_PATH")]
        path: String,
        #[arg(long, value_name = "RESOLVED_PATH")]
        anchor: Option<String>,
        /// Create the identifier for a new asset
        #[arg(long)]
        new: bool,
    },
    /// Show how a package-relative path splits
    Split {
        #[arg(value_name = "ASSET_PATH")]
        path: String,
    },
    /// List registered resolvers and their capabilities
    Resolvers,
}

fn parse_context(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(scheme, context)| (scheme.to_string(), context.to_string()))
        .ok_or_else(|| format!("expected SCHEME=STRING, got '{}'", raw))
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _guard = assetres_runtime::init_logging("cli", false);

    match cli.command {
        Commands::Resolve {
            path,
            search_paths,
            contexts,
        } => resolve::run(&path, search_paths, &contexts),
        Commands::Identifier { path, anchor, new } => identifier::run(&path, anchor, new),
        Commands::Split { path } => split::run(&path),
        Commands::Resolvers => resolvers::run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_context_splits_on_first_equals() {
        assert_eq!(
            parse_context("studio=show=abc").unwrap(),
            ("studio".to_string(), "show=abc".to_string())
        );
        assert_eq!(
            parse_context("=/a:/b").unwrap(),
            (String::new(), "/a:/b".to_string())
        );
        assert!(parse_context("studio").is_err());
    }

    #[test]
    fn test_resolve_arguments() {
        let cli = Cli::try_parse_from([
            "assetres",
            "resolve",
            "model.usd",
            "--search-path",
            "/a",
            "--search-path",
            "/b",
            "--context",
            "test=ctx",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve {
                path,
                search_paths,
                contexts,
            } => {
                assert_eq!(path, "model.usd");
                assert_eq!(search_paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
                assert_eq!(contexts, vec![("test".to_string(), "ctx".to_string())]);
            }
            _ => panic!("expected resolve"),
        }
    }
}
