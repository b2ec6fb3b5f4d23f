//! Resolves a client-supplied path-or-name into a workspace handle.
//!
//! Real project discovery (language detection, config file parsing, ...) is
//! out of scope here and is treated as an external collaborator; this trait
//! is the narrow seam the server calls through.

use gw_tools::Workspace;

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("unknown workspace: {0}")]
    NotFound(String),
}

pub trait ProjectResolver: Send + Sync {
    fn resolve(&self, path_or_name: &str) -> Result<Workspace, ProjectError>;
}

/// Resolves a path on disk: the workspace name is the final path component,
/// the root is the path itself. Rejects anything that isn't an existing
/// directory.
pub struct FilesystemProjectResolver;

impl ProjectResolver for FilesystemProjectResolver {
    fn resolve(&self, path_or_name: &str) -> Result<Workspace, ProjectError> {
        let path = std::path::Path::new(path_or_name);
        if !path.is_dir() {
            return Err(ProjectError::NotFound(path_or_name.to_string()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path_or_name.to_string());
        Ok(Workspace::new(name, path_or_name.to_string()))
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
