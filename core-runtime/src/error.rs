use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Logging initialization failed: {0}")]
    LoggingInit(String),

    #[error("Missing configuration value: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
