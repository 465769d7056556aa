use crate::Target;

/// Engine error taxonomy. Configuration, dictionary-load, and registration
/// errors are fatal at startup; `UnsupportedProtocol`/`HandlerFailure`
/// surface as failed [`crate::AttemptResult`]s, not through this type, but
/// are listed here for completeness of the taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("failed to load dictionary {path}: {source}")]
    DictionaryLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown target: {0}")]
    UnknownTarget(Target),

    #[error("no handler registered for protocol {0:?}")]
    UnsupportedProtocol(String),

    #[error("handler failure: {0}")]
    HandlerFailure(String),

    #[error("cancelled")]
    Cancelled,
}
