use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Cannot translate {0} into itself")]
    SameLanguage(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed attribution: {0}")]
    Tag(#[from] TagError),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl SyncError {
    /// Errors raised before any work starts.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::Config(_)
                | SyncError::UnknownLanguage(_)
                | SyncError::SameLanguage(_)
                | SyncError::UnknownProvider(_)
                | SyncError::Provider(ProviderError::Configuration(_))
        )
    }
}

#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Batch result count mismatch: sent {sent}, received {received}")]
    CountMismatch { sent: usize, received: usize },

    #[error("Provider misconfigured: {0}")]
    Configuration(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("attribution tag `{tag}` has {parts} parts, expected 3")]
    WrongPartCount { tag: String, parts: usize },

    #[error("attribution tag `{0}` has an empty part")]
    EmptyPart(String),

    #[error("unknown entity kind `{0}`")]
    UnknownKind(String),

    #[error("entity kind `{kind}` has no translatable field `{field}`")]
    UnknownField { kind: String, field: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown entity {kind}#{id}")]
    UnknownEntity { kind: String, id: String },

    #[error("entity kind `{kind}` has no translatable field `{field}`")]
    UnknownField { kind: String, field: String },

    #[error("primary language `{0}` is stored on the entity, not as a record")]
    PrimaryLanguage(String),

    #[error("failed to persist store: {0}")]
    Persist(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
