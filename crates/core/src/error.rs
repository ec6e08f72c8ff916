use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TheaError {
    #[error("Unknown view: {0}")]
    UnknownView(String),

    #[error("Config error: {0}")]
    Config(String),
}
