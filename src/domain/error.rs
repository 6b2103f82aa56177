use thiserror::Error;

/// rostovcli unified error type
#[derive(Error, Debug)]
pub enum RostovError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Environment error: {message}")]
    Environment { message: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Probe error: {0}")]
    Probe(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),
}

pub type RostovResult<T> = Result<T, RostovError>;
