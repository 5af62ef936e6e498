use serde::Deserialize;
use std::path::Path;

use crate::Error;

/// Declarative description of the workshop: the Gitea endpoint, the admin
/// credentials and the batch of users to provision.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkshopManifest {
    #[serde(rename = "giteaURL")]
    pub gitea_url: String,
    #[serde(rename = "giteaAdminUserName")]
    pub gitea_admin_user: String,
    #[serde(rename = "giteaAdminUserPassword")]
    pub gitea_admin_password: String,
    pub users: UserBatch,
}

/// The user batch: a contiguous inclusive integer range, one user per
/// index, plus the per-user OAuth app naming and the template repos to
/// mirror into each user's namespace.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBatch {
    pub from: u32,
    pub to: u32,
    #[serde(default)]
    pub add_kubernetes_secret: bool,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(rename = "oAuthAppName")]
    pub oauth_app_name: String,
    #[serde(rename = "oAuthRedirectURI")]
    pub oauth_redirect_uri: String,
    #[serde(default)]
    pub secret_namespace: Option<String>,
    #[serde(default)]
    pub repos: Vec<String>,
}

impl WorkshopManifest {
    /// Read and parse a manifest file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        let manifest = serde_yaml::from_str(&contents)?;
        Ok(manifest)
    }

    /// Check the manifest invariants. Runs before any network call.
    pub fn validate(&self) -> Result<(), Error> {
        if self.users.from > self.users.to {
            return Err(Error::Validation(format!(
                "invalid user range: from ({}) must not exceed to ({})",
                self.users.from, self.users.to
            )));
        }
        Ok(())
    }
}
