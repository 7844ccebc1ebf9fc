//! Application constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

use std::time::Duration;

/// HTTP client configuration
pub mod http {
    use super::*;

    /// Connection timeout for upstream requests
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// User agent sent to providers
    pub const USER_AGENT: &str = "appforge/0.1";

    /// Maximum accepted request body for the HTTP surface (2 MiB)
    pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

    /// Default bind address for `appforge serve`
    pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
}

/// Generation gateway configuration
pub mod gateway {
    use super::*;

    /// Budget fractions walked on quota exhaustion, in order
    pub const BUDGET_LADDER: [f32; 4] = [1.0, 0.75, 0.5, 0.25];

    /// Budget fraction used when retrying a prompt that was too long
    pub const PROMPT_TOO_LARGE_FRACTION: f32 = 0.5;

    /// History turns kept when the window is shrunk
    pub const REDUCED_HISTORY_TURNS: usize = 2;

    /// Default per-provider timeout budget
    pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(120);
}

/// Planning decomposer configuration
pub mod planning {
    use super::*;

    /// Wall-clock budget for one planning request
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Upper bound on tasks accepted from a provider response
    pub const MAX_TASKS: usize = 24;

    /// Minutes per task in the fallback plan
    pub const FALLBACK_TASK_MINUTES: u32 = 5;

    /// Ceiling for one provider-estimated task (one working week)
    pub const MAX_TASK_MINUTES: u32 = 5 * 8 * 60;
}

/// Configuration file locations
pub mod config {
    /// Config directory name (under the home directory)
    pub const CONFIG_DIR_NAME: &str = ".appforge";

    /// Config file name inside the config directory
    pub const CONFIG_FILE_NAME: &str = "config.toml";

    /// Prefix for every environment override
    pub const ENV_PREFIX: &str = "APPFORGE";
}
