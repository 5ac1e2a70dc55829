use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Failure to turn an upstream resource identifier into a document id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The identifier has no `/`-delimited trailing segment.
    #[error("malformed identifier \"{0}\": expected `scheme://namespace/Type/id`")]
    Malformed(String),

    /// The record carried no identifier at all.
    #[error("missing identifier on {0}")]
    Missing(&'static str),
}
