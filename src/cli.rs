use clap::{Parser, Subcommand};

/// ticklist — dynamic reviewer checklists for pull requests
#[derive(Parser, Debug, Clone)]
#[command(name = "ticklist", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Path to the tool config file (default: .ticklist/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Path to the rule table JSON (default: .ticklist/mappings.json)
    #[arg(long, global = true)]
    pub mappings: Option<String>,

    /// Repository in owner/name form (default: $GITHUB_REPOSITORY)
    #[arg(long, global = true)]
    pub repo: Option<String>,

    /// Author login whose previous checklist comment gets replaced
    #[arg(long, global = true)]
    pub bot_login: Option<String>,

    /// Compute and print the checklist without touching PR comments
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Fetch a pull request diff, derive the checklist, and sync the PR comment
    Run {
        /// Pull request number
        #[arg(long)]
        pr: u64,
    },

    /// Derive a checklist from a local diff and print it
    Check {
        /// Unified diff file to read (stdin when omitted)
        #[arg(long)]
        diff_file: Option<String>,
    },

    /// Load and compile the rule table, reporting configuration defects
    Validate,
}
