use std::io::Read;
use std::path::Path;

use clap::Parser;
use tracing::{info, warn};

use ticklist::checklist;
use ticklist::cli::{Cli, CliCommand};
use ticklist::config::Config;
use ticklist::error::Result;
use ticklist::github::{self, PullRequestComments};
use ticklist::rules::{self, CompiledRule, RuleKind};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        CliCommand::Run { pr } => run(&config, *pr),
        CliCommand::Check { diff_file } => check(&config, diff_file.as_deref()),
        CliCommand::Validate => validate(&config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// CI mode: fetch the PR diff, derive the checklist, and replace any
/// previously posted checklist comment.
fn run(config: &Config, pr: u64) -> Result<()> {
    let rules = rules::load(Path::new(&config.mappings))?;
    info!(count = rules.len(), "loaded rule table");

    let repo = github::resolve_repo(config.repo.as_deref())?;
    let comments = PullRequestComments::new(repo, config.bot_login.clone())?;

    let diff = comments.fetch_diff(pr)?;
    let rendered = checklist::render(&diff, &rules);

    if config.dry_run {
        info!("dry run: leaving PR comments untouched");
        if !rendered.is_empty() {
            println!("{rendered}");
        }
        return Ok(());
    }

    comments.delete_previous(pr)?;
    if rendered.is_empty() {
        info!("no checklist items matched the change");
    } else {
        comments.post(pr, &rendered)?;
        println!("{rendered}");
    }
    Ok(())
}

/// Local mode: render the checklist for a diff read from a file or stdin.
/// A missing rule file is treated as an empty table so the command works in
/// repositories that have not set up mappings yet.
fn check(config: &Config, diff_file: Option<&str>) -> Result<()> {
    let mappings_path = Path::new(&config.mappings);
    let rules = if mappings_path.exists() {
        rules::load(mappings_path)?
    } else {
        warn!(path = %config.mappings, "rule table not found, using empty table");
        Vec::new()
    };

    let diff = match diff_file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let rendered = checklist::render(&diff, &rules);
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    Ok(())
}

/// Compile the rule table and print a per-rule summary, failing on
/// configuration defects.
fn validate(config: &Config) -> Result<()> {
    let rules = rules::load(Path::new(&config.mappings))?;
    println!("rule table ok: {} rules", rules.len());
    for (index, rule) in rules.iter().enumerate() {
        println!("  rule {}: {}", index + 1, describe_rule(rule));
    }
    Ok(())
}

fn describe_rule(rule: &CompiledRule) -> String {
    let items = rule.items.len();
    match &rule.kind {
        RuleKind::Always => format!("always, {items} item(s)"),
        RuleKind::Content { triggers, scope } => match scope {
            Some(scope) => format!(
                "{} trigger(s), {items} item(s), scoped to {} path glob(s)",
                triggers.len(),
                scope.patterns().len()
            ),
            None => format!("{} trigger(s), {items} item(s)", triggers.len()),
        },
    }
}
