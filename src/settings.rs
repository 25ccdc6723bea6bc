use std::path::PathBuf;
use std::time::Duration;

use crate::paths;

/// Environment variable that turns on forwarding of the node's stdout/stderr.
pub const FORWARD_LOGS_ENV: &str = "TM_LOG";

/// How long a managed process's output is left for the caller before it is drained.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(4);

/// Sleep between readiness polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Default deadline for the `started` gate. `synced` has none.
pub const DEFAULT_STARTED_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide knobs for launching and supervising the node binary.
#[derive(Debug, Clone)]
pub struct Settings {
    pub binary: PathBuf,
    /// Copy child output to our own stdout/stderr instead of draining it.
    pub forward_logs: bool,
    pub drain_grace: Duration,
    pub poll_interval: Duration,
    pub started_timeout: Duration,
}

impl Settings {
    /// Build settings from `TM_BINARY` / `TM_LOG` and the defaults above.
    pub fn from_env() -> Self {
        let forward_logs = std::env::var_os(FORWARD_LOGS_ENV).is_some_and(|v| !v.is_empty());
        Self {
            binary: paths::binary_path(),
            forward_logs,
            ..Self::with_binary(PathBuf::new())
        }
    }

    /// Defaults with an explicit binary and forwarding off.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            forward_logs: false,
            drain_grace: DEFAULT_DRAIN_GRACE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            started_timeout: DEFAULT_STARTED_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::with_binary("/usr/bin/tendermint");
        assert_eq!(settings.binary, PathBuf::from("/usr/bin/tendermint"));
        assert!(!settings.forward_logs);
        assert_eq!(settings.drain_grace, Duration::from_secs(4));
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
        assert_eq!(settings.started_timeout, Duration::from_secs(30));
    }
}
