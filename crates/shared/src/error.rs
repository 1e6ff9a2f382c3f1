use thiserror::Error;

/// Problems with the run configuration. These abort the run before any network activity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not found. Set it in the environment or in ~/.config/stablecoin-draft/.env")]
    Missing(&'static str),

    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}
