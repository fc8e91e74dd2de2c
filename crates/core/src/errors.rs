use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("signal section `{section}` must be {expected}")]
    MalformedSection { section: String, expected: &'static str },
    #[error("component is not configured: {0}")]
    NotConfigured(String),
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("i/o failure: {0}")]
    Io(String),
    #[error("could not parse input: {0}")]
    Parse(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::InvalidInput(_))
            | Self::Domain(DomainError::MalformedSection { .. }) => "invalid_input",
            Self::Domain(DomainError::NotConfigured(_)) => "not_configured",
            Self::Domain(DomainError::InvalidConfig(_)) => "invalid_config",
            Self::Domain(DomainError::InvariantViolation(_)) => "invariant_violation",
            Self::Io(_) => "io",
            Self::Parse(_) => "parse",
            Self::Configuration(_) => "config_validation",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Io(_) | Self::Parse(_) => 3,
            Self::Domain(_) => 4,
        }
    }
}
