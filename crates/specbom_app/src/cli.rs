use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "specbom",
    version,
    about = "Upload engineering specs, run BOM generation and manage the catalogue"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// RON configuration file; flags and environment take precedence.
    #[arg(long, global = true, env = "SPECBOM_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogTarget::Terminal)]
    pub log: LogTarget,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Platform API base, or the relay address when running through `specbom proxy`.
    #[arg(long, global = true, env = "VERTESIA_API_BASE")]
    pub api_base: Option<String>,

    #[arg(long, global = true, env = "VERTESIA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true, env = "VERTESIA_ENVIRONMENT_ID")]
    pub environment: Option<String>,

    #[arg(long, global = true, env = "VERTESIA_MODEL")]
    pub model: Option<String>,

    #[arg(long, global = true, env = "SPECBOM_INTERACTION")]
    pub interaction: Option<String>,

    #[arg(long, global = true, env = "SPECBOM_POLL_SECS")]
    pub poll_secs: Option<u64>,

    #[arg(long, global = true, env = "SPECBOM_MAX_IDLE_TICKS")]
    pub max_idle_ticks: Option<u32>,

    #[arg(long, global = true, env = "SPECBOM_QUEUE_TTL_MINUTES")]
    pub queue_ttl_minutes: Option<i64>,

    #[arg(long, global = true)]
    pub request_timeout_secs: Option<u64>,

    /// Where downloads are written.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload spec documents and start a BOM generation job for each.
    Generate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Return once jobs are launched instead of waiting for BOMs.
        #[arg(long)]
        no_wait: bool,
    },
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Show the catalogue and/or generated BOMs.
    List {
        #[arg(value_enum, default_value_t = ListTarget::All)]
        which: ListTarget,
    },
    /// Print a signed link to an object's content.
    View { id: String },
    /// Save an object's content into the output directory.
    Download { id: String },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Run the relay that attaches the platform credential server-side.
    Proxy {
        #[arg(long, env = "SPECBOM_PROXY_LISTEN")]
        listen: Option<SocketAddr>,
    },
}

/// Manage catalogue items.
#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// Upload reference documents to the catalogue.
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListTarget {
    Catalog,
    Boms,
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_with_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "specbom",
            "generate",
            "a.pdf",
            "b.pdf",
            "--no-wait",
            "--poll-secs",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.global.poll_secs, Some(2));
        match cli.command {
            Command::Generate { files, no_wait } => {
                assert_eq!(files.len(), 2);
                assert!(no_wait);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn generate_requires_files() {
        assert!(Cli::try_parse_from(["specbom", "generate"]).is_err());
    }

    #[test]
    fn list_defaults_to_all() {
        let cli = Cli::try_parse_from(["specbom", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::List {
                which: ListTarget::All
            }
        ));
    }
}
