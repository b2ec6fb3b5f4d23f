use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("could not determine a state directory for the registry")]
    NoStateDir,

    #[error("failed to acquire the registry lock within {0:?}")]
    LockTimeout(std::time::Duration),

    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize registry document: {0}")]
    Serialize(#[from] serde_json::Error),
}
