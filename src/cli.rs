// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskgroup`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskgroup",
    version,
    about = "Run a dependency graph of tasks described in a TOML file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Taskgroup.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Taskgroup.toml")]
    pub config: String,

    /// Invoke the graph rooted at this task instead of the configured or
    /// inferred root.
    #[arg(long, value_name = "NAME")]
    pub root: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKGROUP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the graph, but don't run any task.
    #[arg(long)]
    pub dry_run: bool,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_taskgroup_toml() {
        let args = CliArgs::parse_from(["taskgroup"]);
        assert_eq!(args.config, "Taskgroup.toml");
        assert!(args.root.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn parses_root_and_level() {
        let args = CliArgs::parse_from([
            "taskgroup",
            "--config",
            "graph.toml",
            "--root",
            "vm",
            "--log-level",
            "debug",
            "--dry-run",
        ]);
        assert_eq!(args.config, "graph.toml");
        assert_eq!(args.root.as_deref(), Some("vm"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.dry_run);
    }
}
