pub mod args;
pub mod cli;

use std::time::Duration;

use crate::domain::types::TaintPolicy;

/// How to reach the NUT server and which devices to handle.
#[derive(Clone)]
pub struct NutSettings {
    pub address: String,
    pub username: String,
    pub password: String,
    /// Empty means every device the server lists.
    pub ups_names: Vec<String>,
    pub timeout: Duration,
}

impl NutSettings {
    pub fn handles(&self, ups: &str) -> bool {
        self.ups_names.is_empty() || self.ups_names.iter().any(|name| name == ups)
    }
}

impl std::fmt::Debug for NutSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NutSettings")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ups_names", &self.ups_names)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl From<&args::RunArgs> for NutSettings {
    fn from(args: &args::RunArgs) -> Self {
        Self {
            address: args.nut_address.clone(),
            username: args.nut_username.clone(),
            password: args.nut_password.clone(),
            ups_names: args
                .ups_names
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            timeout: args.request_timeout(),
        }
    }
}

impl From<&args::RunArgs> for TaintPolicy {
    fn from(args: &args::RunArgs) -> Self {
        Self {
            taint_key: args.taint_key.clone(),
            battery_threshold: args.battery_threshold,
        }
    }
}

pub use args::*;
pub use cli::*;
