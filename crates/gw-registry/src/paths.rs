//! Resolves where the registry document and its lock file live.
//!
//! `GW_STATE_DIR` takes precedence, then `XDG_STATE_HOME`, falling back to
//! `~/.local/state/gw-gateway`.

use std::path::PathBuf;

pub const REGISTRY_FILENAME: &str = "instances.json";
pub const LOCK_FILENAME: &str = "instances.lock";

pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("GW_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("gw-gateway"));
    }
    dirs::home_dir().map(|home| home.join(".local").join("state").join("gw-gateway"))
}
