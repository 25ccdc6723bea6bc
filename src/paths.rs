use std::path::PathBuf;

use tracing::debug;

/// Environment variable overriding the node binary location.
pub const BINARY_ENV: &str = "TM_BINARY";

/// File name of the node binary.
pub const BINARY_NAME: &str = "tendermint";

/// Resolve the node binary.
///
/// Order: `TM_BINARY`, a `tendermint` next to the current executable, `tendermint`
/// on `PATH`, and finally the bare name so the spawn error names what was missing.
pub fn binary_path() -> PathBuf {
    if let Some(path) = std::env::var_os(BINARY_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }

    let resolved = std::env::current_exe()
        .ok()
        .and_then(|exe| {
            let candidate = exe.parent()?.join(BINARY_NAME);
            candidate.exists().then_some(candidate)
        })
        .or_else(|| which::which(BINARY_NAME).ok());

    match resolved {
        Some(path) => {
            debug!(binary = %path.display(), "resolved node binary");
            path
        }
        None => PathBuf::from(BINARY_NAME),
    }
}
