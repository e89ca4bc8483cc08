use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteBackError {
    /// The identity service could not vouch for the caller. `status` carries the
    /// service's own HTTP status when it answered at all.
    #[error("identity service unavailable: {message}")]
    IdentityUnavailable {
        status: Option<u16>,
        message: String,
    },

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("{override_type} is not a subtype of {base}")]
    InvalidOverride { override_type: String, base: String },

    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store unavailable: {message}")]
    StoreUnavailable {
        status: Option<u16>,
        message: String,
    },

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl WriteBackError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::IdentityUnavailable {
                status: Some(status),
                ..
            } if (400..600).contains(status) => *status,
            Self::IdentityUnavailable { .. } => 502,
            Self::UnknownType(_) => 404,
            Self::InvalidOverride { .. } => 422,
            Self::MissingRequiredField(_) => 422,
            Self::InvalidInput(_) => 422,
            Self::StoreUnavailable { .. } => 502,
            Self::Internal(_) => 500,
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            status: None,
            message: message.into(),
        }
    }

    pub fn store_status(status: u16, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn identity(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::IdentityUnavailable {
            status,
            message: message.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequiredField(field.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, WriteBackError>;
