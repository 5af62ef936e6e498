use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod k8s;
mod manifest;
mod naming;
mod secrets;
#[cfg(test)]
mod testutil;

use cli::{Cli, Command};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("Gitea error: {0}")]
    Gitea(#[from] gitea_client::Error),
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),
    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),
    #[error("in-cluster config error: {0}")]
    InCluster(#[from] kube::config::InClusterError),
    #[error("invalid repository URL '{0}'")]
    InvalidRepoUrl(String),
    #[error("entropy source failure: {0}")]
    Entropy(rand_core::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest parse error: {0}")]
    Manifest(#[from] serde_yaml::Error),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over the flag when set.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cli.verbose)?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Version => {
            println!("workshopper {}", env!("CARGO_PKG_VERSION"));
        }
        Command::Oauthapp {
            app_name,
            app_redirect_url,
            gitea_admin_user,
            gitea_admin_password,
            gitea_url,
            add_k8s_secret,
            k8s_namespace,
            kubeconfig,
        } => {
            commands::cmd_oauth_app(
                &app_name,
                &app_redirect_url,
                &gitea_admin_user,
                &gitea_admin_password,
                &gitea_url,
                add_k8s_secret,
                k8s_namespace.as_deref(),
                kubeconfig.as_deref(),
            )
            .await?;
        }
        Command::SetupWorkshop {
            workshop_file,
            kubeconfig,
        } => {
            commands::cmd_setup_workshop(&workshop_file, kubeconfig.as_deref()).await?;
        }
    }

    Ok(())
}
