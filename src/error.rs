use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("rule table not found: {0}")]
    RuleTableNotFound(PathBuf),

    #[error("rule table parse error: {0}")]
    RuleTableParse(#[from] serde_json::Error),

    #[error("rule validation error: {0}")]
    RuleValidation(String),

    #[error("invalid trigger pattern {0}")]
    InvalidTrigger(String),

    #[error("invalid path glob {0}")]
    InvalidGlob(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("github error: {0}")]
    GitHub(String),
}

pub type Result<T> = std::result::Result<T, Error>;
