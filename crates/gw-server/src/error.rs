use gw_core::SessionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown session {0}")]
    UnknownSession(SessionId),

    #[error("Session {0} is disconnected")]
    SessionDisconnected(SessionId),

    #[error("unknown workspace: {0}")]
    UnknownWorkspace(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Registry(#[from] gw_registry::RegistryError),
}
