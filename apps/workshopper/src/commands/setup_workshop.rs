use std::path::Path;

use gitea_client::{GiteaClient, StatusCode};
use tracing::{debug, info};

use crate::commands::oauth_app::{reconcile_oauth_app, OAuthAppOutcome};
use crate::manifest::WorkshopManifest;
use crate::{k8s, naming, secrets, Error};

/// Outcome of one workshop run.
#[derive(Debug, Default)]
pub struct WorkshopSummary {
    /// Usernames created by this run.
    pub created: Vec<String>,
    /// Usernames that already existed and were only re-reconciled.
    pub existing: Vec<String>,
}

/// Load the workshop manifest and provision it.
pub async fn cmd_setup_workshop(
    workshop_file: &Path,
    kubeconfig: Option<&Path>,
) -> Result<(), Error> {
    let manifest = WorkshopManifest::load_from(workshop_file)?;
    debug!("{:?}", manifest);

    let summary = run_workshop(&manifest, kubeconfig).await?;
    info!(
        "Workshop provisioning complete: {} users created, {} already existed",
        summary.created.len(),
        summary.existing.len()
    );

    Ok(())
}

/// Provision every user in the manifest range: the account itself, its
/// OAuth application and the mirrored template repositories. Each step
/// is idempotent, so a run aborted halfway can simply be re-run. The
/// loop stops at the first error; earlier users stay provisioned.
pub async fn run_workshop(
    manifest: &WorkshopManifest,
    kubeconfig: Option<&Path>,
) -> Result<WorkshopSummary, Error> {
    manifest.validate()?;

    let admin = GiteaClient::new(
        &manifest.gitea_url,
        &manifest.gitea_admin_user,
        &manifest.gitea_admin_password,
    )?;

    let users = &manifest.users;
    let kube_client = if users.add_kubernetes_secret {
        Some(k8s::load_kube_client(kubeconfig).await?)
    } else {
        None
    };

    let mut summary = WorkshopSummary::default();

    for i in users.from..=users.to {
        let username = format!("user-{:02}", i);

        match admin.get_user(&username).await? {
            Some(user) => {
                info!("User {} already exists", user.username);
                summary.existing.push(username.clone());
            }
            None => {
                let email = format!("user-{:02}@example.com", i);
                let password = format!("user-{:02}@123", i);
                let user = admin.create_user(&username, &email, &password).await?;
                info!("Created user with username {}", user.username);
                summary.created.push(username.clone());
            }
        }

        // Everything below acts as the workshop user, not the admin.
        let scoped = admin.sudo(&username);

        let app_name = format!("{}-user-{:02}", users.oauth_app_name, i);
        let outcome = reconcile_oauth_app(&scoped, &app_name, &users.oauth_redirect_uri).await?;

        if let Some(kube_client) = &kube_client {
            match &outcome {
                OAuthAppOutcome::Created(app) => {
                    secrets::persist_oauth_credential(
                        kube_client.clone(),
                        users.secret_namespace.as_deref(),
                        &app_name,
                        &app.client_id,
                        &app.client_secret,
                    )
                    .await?;
                }
                OAuthAppOutcome::Updated(_) => {
                    info!(
                        "oAuth app {} already existed; the client secret is not re-issued, leaving the Kubernetes secret unchanged",
                        app_name
                    );
                }
            }
        }

        for repo_url in &users.repos {
            ensure_repo_mirrored(&scoped, &username, repo_url).await?;
        }
    }

    Ok(summary)
}

/// Mirror `source_url` into `owner`'s namespace unless it is already
/// there. A lookup answered with a zero-value record counts as absent;
/// a conflict from the migration itself counts as success.
pub async fn ensure_repo_mirrored(
    client: &GiteaClient,
    owner: &str,
    source_url: &str,
) -> Result<(), Error> {
    let repo_name = naming::repo_name_from_url(source_url)?;

    let existing = client
        .get_repo(owner, &repo_name)
        .await?
        .filter(|repo| !repo.name.is_empty());

    if let Some(repo) = existing {
        info!(
            "Repo {} already exists for user {}, skipping creation, you can clone via {}",
            repo.name, owner, repo.clone_url
        );
        return Ok(());
    }

    match client.migrate_repo(source_url, owner, &repo_name).await {
        Ok(repo) => {
            info!(
                "Repo {} successfully created for user {}, you can clone via {}",
                repo.name, owner, repo.clone_url
            );
            Ok(())
        }
        Err(err) if err.status() == Some(StatusCode::CONFLICT) => {
            info!(
                "Repo {} already exists for user {}, skipping creation",
                repo_name, owner
            );
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
