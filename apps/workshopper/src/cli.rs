use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "workshopper")]
#[command(about = "A helper to interact with and configure Gitea using its REST API")]
pub struct Cli {
    /// The logging level to set
    #[arg(short, long, global = true, default_value = "warn")]
    pub verbose: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print version information
    Version,
    /// Create or update a Gitea OAuth application
    Oauthapp {
        /// The Gitea OAuth application name
        #[arg(short = 'a', long)]
        app_name: String,

        /// The Gitea OAuth application redirect URL
        #[arg(
            short = 'r',
            long,
            default_value = "http://drone-127.0.0.1.sslip.io:30980"
        )]
        app_redirect_url: String,

        /// The Gitea admin username
        #[arg(short = 'u', long, env = "GITEA_ADMIN_USER", default_value = "demo")]
        gitea_admin_user: String,

        /// The Gitea admin user password
        #[arg(
            short = 'p',
            long,
            env = "GITEA_ADMIN_PASSWORD",
            default_value = "demo@123"
        )]
        gitea_admin_password: String,

        /// The Gitea URL
        #[arg(
            short = 'g',
            long,
            env = "GITEA_URL",
            default_value = "http://gitea-127.0.0.1.sslip.io:30950"
        )]
        gitea_url: String,

        /// Create a Kubernetes secret holding the client id and client
        /// secret of the OAuth application
        #[arg(short = 's', long)]
        add_k8s_secret: bool,

        /// The namespace where to create the Kubernetes secret
        #[arg(short = 'n', long)]
        k8s_namespace: Option<String>,

        /// The kubeconfig file to use
        #[arg(short = 'k', long, env = "KUBECONFIG")]
        kubeconfig: Option<PathBuf>,
    },
    /// Provision the workshop described by a manifest file
    SetupWorkshop {
        /// The workshop configuration file
        #[arg(short = 'f', long)]
        workshop_file: PathBuf,

        /// The kubeconfig file to use
        #[arg(short = 'k', long, env = "KUBECONFIG")]
        kubeconfig: Option<PathBuf>,
    },
}
