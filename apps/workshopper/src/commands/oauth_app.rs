use std::path::Path;

use gitea_client::{GiteaClient, OAuth2Application};
use tracing::{debug, info};

use crate::{k8s, secrets, Error};

/// Result of reconciling an OAuth application towards "exactly one app
/// with this name exists".
#[derive(Debug)]
pub enum OAuthAppOutcome {
    /// The app was created; client id and secret are populated.
    Created(OAuth2Application),
    /// The app already existed and was updated in place. Gitea does not
    /// return the client secret on this path.
    Updated(OAuth2Application),
}

impl OAuthAppOutcome {
    pub fn app(&self) -> &OAuth2Application {
        match self {
            OAuthAppOutcome::Created(app) | OAuthAppOutcome::Updated(app) => app,
        }
    }
}

/// The redirect URI set registered for an app: the configured base with
/// the `/login` callback path appended.
fn redirect_uris(redirect_base: &str) -> Vec<String> {
    vec![format!("{}/login", redirect_base)]
}

/// Ensure exactly one OAuth application named `name` exists for the
/// current identity. An existing app is always updated, without diffing,
/// so the registered redirect URI converges on every run.
pub async fn reconcile_oauth_app(
    client: &GiteaClient,
    name: &str,
    redirect_base: &str,
) -> Result<OAuthAppOutcome, Error> {
    let uris = redirect_uris(redirect_base);
    let apps = client.list_oauth2_apps().await?;

    match apps.into_iter().find(|app| app.name == name) {
        Some(existing) => {
            info!("oAuth app {} already exists, updating", name);
            let updated = client.update_oauth2_app(existing.id, name, &uris).await?;
            Ok(OAuthAppOutcome::Updated(updated))
        }
        None => {
            debug!("Creating new oAuth app {}", name);
            let created = client.create_oauth2_app(name, &uris).await?;
            info!("Successfully created oAuth application {}", name);
            Ok(OAuthAppOutcome::Created(created))
        }
    }
}

/// Create or update a single OAuth application, optionally persisting
/// the credentials as a Kubernetes secret.
#[allow(clippy::too_many_arguments)]
pub async fn cmd_oauth_app(
    app_name: &str,
    app_redirect_url: &str,
    gitea_admin_user: &str,
    gitea_admin_password: &str,
    gitea_url: &str,
    add_k8s_secret: bool,
    k8s_namespace: Option<&str>,
    kubeconfig: Option<&Path>,
) -> Result<(), Error> {
    if add_k8s_secret && k8s_namespace.map_or(true, str::is_empty) {
        return Err(Error::Validation(format!(
            "require namespace to create the {} secret",
            app_name
        )));
    }

    let client = GiteaClient::new(gitea_url, gitea_admin_user, gitea_admin_password)?;

    match reconcile_oauth_app(&client, app_name, app_redirect_url).await? {
        OAuthAppOutcome::Created(app) => {
            debug!(
                "oAuth application {} ClientID:{} ClientSecret:{}",
                app_name, app.client_id, app.client_secret
            );
            if add_k8s_secret {
                let kube_client = k8s::load_kube_client(kubeconfig).await?;
                secrets::persist_oauth_credential(
                    kube_client,
                    k8s_namespace,
                    app_name,
                    &app.client_id,
                    &app.client_secret,
                )
                .await?;
            }
        }
        OAuthAppOutcome::Updated(_) => {
            if add_k8s_secret {
                info!(
                    "oAuth app {} already existed; the client secret is not re-issued, leaving the Kubernetes secret unchanged",
                    app_name
                );
            }
        }
    }

    Ok(())
}
