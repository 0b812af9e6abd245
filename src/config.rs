use serde::{Deserialize, Serialize};

/// Settings applied when building the HTTP transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// User agent sent with every request.
    pub user_agent: String,
    /// Whole-request timeout in seconds. `None` imposes no timeout; the
    /// remote side may hold large uploads for a while.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("adbatch/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
        }
    }
}
