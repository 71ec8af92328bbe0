use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::domain::types::DEFAULT_NODE_LABEL;
use crate::domain::types::DEFAULT_TAINT_KEY;

#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    #[arg(
        long,
        env = "NUT_ADDRESS",
        help = "NUT server address as host or host:port, port defaults to 3493"
    )]
    pub nut_address: String,

    #[arg(
        long,
        env = "NUT_USERNAME",
        default_value = "",
        help = "NUT username, authentication is skipped when empty"
    )]
    pub nut_username: String,

    #[arg(
        long,
        env = "NUT_PASSWORD",
        default_value = "",
        hide_env_values = true,
        help = "NUT password"
    )]
    pub nut_password: String,

    #[arg(
        long = "ups-name",
        env = "NUT_UPS_NAME",
        value_delimiter = ',',
        help = "Only handle these UPS devices (comma separated), all listed devices when unset"
    )]
    pub ups_names: Vec<String>,

    #[arg(
        long,
        env = "UPS_BATTERY_THRESHOLD",
        default_value_t = 20.0,
        help = "Battery percentage below which nodes are evicted, 0 disables the check"
    )]
    pub battery_threshold: f32,

    #[arg(
        long,
        env = "UPS_TAINT_KEY",
        default_value = DEFAULT_TAINT_KEY,
        help = "Key of the taint managed on nodes"
    )]
    pub taint_key: String,

    #[arg(
        long,
        env = "UPS_NODE_LABEL",
        default_value = DEFAULT_NODE_LABEL,
        help = "Node label whose value names the UPS powering the node"
    )]
    pub node_label: String,

    #[arg(
        long,
        env = "KUBECONFIG",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to kubeconfig file (defaults to cluster config or ~/.kube/config)"
    )]
    pub kubeconfig: Option<PathBuf>,

    #[arg(
        long,
        env = "NUT_REQUEST_TIMEOUT_SECS",
        default_value_t = 30,
        help = "Timeout in seconds for each NUT and Kubernetes request"
    )]
    pub request_timeout_secs: u64,
}

impl RunArgs {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Parser, Clone, Debug)]
pub struct DaemonArgs {
    #[command(flatten)]
    pub run: RunArgs,

    #[arg(
        long,
        env = "UPS_POLL_INTERVAL_SECS",
        default_value_t = 30,
        help = "Seconds between two evaluations"
    )]
    pub interval_secs: u64,
}

impl DaemonArgs {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}
