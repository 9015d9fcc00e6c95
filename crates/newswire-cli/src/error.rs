use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] newswire_core::ValidationError),

    #[error(transparent)]
    Service(#[from] newswire_core::ServiceError),

    #[error("configuration error: {0}")]
    Config(#[from] newswire_core::ConfigError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("interrupted")]
    Interrupted,
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Service(_) => 3,
            Self::Config(_) => 4,
            Self::Serialization(_) => 5,
            Self::Interrupted => 130,
        }
    }
}
