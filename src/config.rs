use std::path::Path;

use serde::Deserialize;

use crate::cli::Cli;
use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = ".ticklist/config.toml";
pub const DEFAULT_MAPPINGS_PATH: &str = ".ticklist/mappings.json";
const DEFAULT_BOT_LOGIN: &str = "github-actions[bot]";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub mappings: Option<String>,
    pub repo: Option<String>,
    pub bot_login: Option<String>,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub mappings: String,
    pub repo: Option<String>,
    pub bot_login: String,
    pub dry_run: bool,
}

impl Config {
    /// Load `.ticklist/config.toml` (or the `--config` override) and merge it
    /// with CLI flags. A missing default config file means "all defaults"; a
    /// missing explicit one is an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match &cli.config {
            Some(path) => {
                let config_path = Path::new(path);
                if !config_path.exists() {
                    return Err(Error::ConfigNotFound(config_path.to_path_buf()));
                }
                parse_config(&std::fs::read_to_string(config_path)?)?
            }
            None => {
                let config_path = Path::new(DEFAULT_CONFIG_PATH);
                if config_path.exists() {
                    parse_config(&std::fs::read_to_string(config_path)?)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        Ok(merge(file_config, cli))
    }
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(ref repo) = config.repo
        && !looks_like_repo_slug(repo)
    {
        return Err(Error::ConfigValidation(format!(
            "repo must be owner/name, got: {repo}"
        )));
    }
    Ok(())
}

fn looks_like_repo_slug(repo: &str) -> bool {
    let mut parts = repo.split('/');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
    )
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Config {
    Config {
        mappings: cli
            .mappings
            .clone()
            .or(file.mappings)
            .unwrap_or_else(|| DEFAULT_MAPPINGS_PATH.to_string()),
        repo: cli.repo.clone().or(file.repo),
        bot_login: cli
            .bot_login
            .clone()
            .or(file.bot_login)
            .unwrap_or_else(|| DEFAULT_BOT_LOGIN.to_string()),
        dry_run: cli.dry_run || file.dry_run.unwrap_or(false),
    }
}
