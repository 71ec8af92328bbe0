use std::path::Path;
use std::time::Duration;

use error_stack::Report;
use error_stack::ResultExt;
use kube::config::KubeConfigOptions;
use kube::config::Kubeconfig;
use kube::Client;
use kube::Config;

use crate::infrastructure::k8s::KubernetesError;

/// Build a client from `kubeconfig`, or infer the configuration when unset
/// (in-cluster service account first, then `~/.kube/config`).
///
/// `timeout` bounds connecting to the API server and every read from it.
pub async fn init_kube_client(
    kubeconfig: Option<&Path>,
    timeout: Duration,
) -> Result<Client, Report<KubernetesError>> {
    let mut config = match kubeconfig {
        Some(path) => load_kubeconfig(path).await?,
        None => Config::infer()
            .await
            .change_context(KubernetesError::ConnectionFailed {
                message: "Failed to infer Kubernetes config".to_string(),
            })?,
    };

    config.connect_timeout = Some(timeout);
    config.read_timeout = Some(timeout);

    Client::try_from(config).change_context(KubernetesError::ConnectionFailed {
        message: "Failed to create Kubernetes client".to_string(),
    })
}

async fn load_kubeconfig(path: &Path) -> Result<Config, Report<KubernetesError>> {
    let kubeconfig =
        Kubeconfig::read_from(path).change_context(KubernetesError::ConnectionFailed {
            message: format!("Failed to read kubeconfig file: {}", path.display()),
        })?;

    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .change_context(KubernetesError::ConnectionFailed {
            message: format!("Failed to create config from kubeconfig: {}", path.display()),
        })
}
