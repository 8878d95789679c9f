//! Listener configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenConfig {
    /// Port to listen on. Overridable via the `PORT` environment variable.
    pub port: u16,

    /// How long to wait for in-flight sessions to finish after a
    /// termination signal before exiting anyway.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

fn default_port() -> u16 {
    10000
}

fn default_shutdown_grace() -> u64 {
    10
}
