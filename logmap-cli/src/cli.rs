//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// logmap -- map Sigma logsources to Windows event channels and event IDs.
///
/// Use `logmap <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logmap", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logmap.toml configuration file (defaults + environment when omitted).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level.
    #[arg(
        long,
        global = true,
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a Sigma rule tree into sysmon/builtin rule trees.
    Convert(ConvertArgs),

    /// Show the merged category map.
    Categories(CategoriesArgs),
}

// ---- convert ----

/// Convert every rule under the Sigma directory.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Sigma rule root directory (overrides `[convert] sigma_dir`).
    #[arg(long)]
    pub sigma_dir: Option<PathBuf>,

    /// Output directory (overrides `[convert] out_dir`).
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Convert without writing any file.
    #[arg(long)]
    pub dry_run: bool,
}

// ---- categories ----

/// Print categories and services with their channel/event ID pairs.
#[derive(Args, Debug)]
pub struct CategoriesArgs {
    /// Show only one category or service.
    #[arg(long)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_convert_defaults() {
        let cli = Cli::try_parse_from(["logmap", "convert"]).expect("parse succeeded");
        assert!(cli.config.is_none(), "config should be optional");
        match cli.command {
            Commands::Convert(args) => {
                assert!(args.sigma_dir.is_none());
                assert!(args.out_dir.is_none());
                assert!(!args.dry_run, "dry_run should default to false");
            }
            _ => panic!("expected Convert command"),
        }
    }

    #[test]
    fn test_cli_parse_convert_with_dirs() {
        let cli = Cli::try_parse_from([
            "logmap",
            "convert",
            "--sigma-dir",
            "/sigma/rules/windows",
            "--out-dir",
            "/out",
            "--dry-run",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.sigma_dir, Some(PathBuf::from("/sigma/rules/windows")));
                assert_eq!(args.out_dir, Some(PathBuf::from("/out")));
                assert!(args.dry_run);
            }
            _ => panic!("expected Convert command"),
        }
    }

    #[test]
    fn test_cli_parse_categories_with_name() {
        let cli = Cli::try_parse_from(["logmap", "categories", "--name", "process_creation"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Categories(args) => {
                assert_eq!(args.name.as_deref(), Some("process_creation"));
            }
            _ => panic!("expected Categories command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "logmap",
            "categories",
            "--output",
            "json",
            "--log-level",
            "debug",
            "--config",
            "logmap.toml",
        ])
        .expect("parse succeeded");
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("logmap.toml")));
    }

    #[test]
    fn test_cli_rejects_unknown_log_level() {
        let result = Cli::try_parse_from(["logmap", "--log-level", "verbose", "convert"]);
        assert!(result.is_err(), "unknown log level should be rejected");
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["logmap"]).is_err());
    }
}
