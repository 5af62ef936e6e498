use std::path::Path;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use crate::Error;

/// Load a Kubernetes client. An explicit kubeconfig path wins; otherwise
/// the default kubeconfig is tried, then the in-cluster environment.
pub async fn load_kube_client(kubeconfig_path: Option<&Path>) -> Result<Client, Error> {
    let config = match kubeconfig_path {
        Some(path) => {
            debug!("Using kubeconfig from {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        }
        None => match Config::from_kubeconfig(&KubeConfigOptions::default()).await {
            Ok(config) => {
                debug!("Using default kubeconfig");
                config
            }
            Err(_) => {
                debug!("Using in-cluster config");
                Config::incluster()?
            }
        },
    };

    Ok(Client::try_from(config)?)
}
