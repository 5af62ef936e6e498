//! Minimal Gitea REST client for workshop provisioning.
//!
//! Wraps a single authenticated session (basic auth) against the Gitea v1
//! API and exposes the administrative operations the provisioner needs:
//! user lookup and creation, OAuth2 application management and repository
//! migration. Acting on behalf of another account is modeled as a scoped
//! clone ([`GiteaClient::sudo`]) rather than mutable session state.

use reqwest::header;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

pub use reqwest::StatusCode;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid Gitea URL '{0}'")]
    InvalidUrl(String),
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// The HTTP status carried by an API error, if that is what this is.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A Gitea user account.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(rename = "login")]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// A registered OAuth2 application.
///
/// `client_secret` is only populated in the response to a create call;
/// list and update responses leave it empty.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2Application {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// A repository under some owner's namespace.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub clone_url: String,
}

#[derive(Debug, Serialize)]
struct CreateUserOption<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    must_change_password: bool,
    send_notify: bool,
}

#[derive(Debug, Serialize)]
struct CreateOauth2Option<'a> {
    name: &'a str,
    redirect_uris: &'a [String],
}

#[derive(Debug, Serialize)]
struct MigrateRepoOption<'a> {
    clone_addr: &'a str,
    repo_owner: &'a str,
    repo_name: &'a str,
}

/// REST client bound to one Gitea instance and one credential pair.
///
/// Cheap to clone. [`sudo`](Self::sudo) hands out clones scoped to
/// another account; the original client is never mutated.
#[derive(Clone)]
pub struct GiteaClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
    sudo: Option<String>,
}

impl GiteaClient {
    /// Create a client for `base_url` authenticating as `username`.
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self, Error> {
        let base_url =
            Url::parse(base_url).map_err(|_| Error::InvalidUrl(base_url.to_string()))?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            username: username.to_string(),
            password: password.to_string(),
            sudo: None,
        })
    }

    /// A client that performs every call on behalf of `username`.
    ///
    /// The returned value is independent of `self`; there is no revert
    /// step because nothing was changed.
    pub fn sudo(&self, username: &str) -> Self {
        let mut scoped = self.clone();
        scoped.sudo = Some(username.to_string());
        scoped
    }

    /// The account this client authenticates as.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Look up a user; `Ok(None)` if the account does not exist.
    pub async fn get_user(&self, username: &str) -> Result<Option<User>, Error> {
        let request = self.request(Method::GET, &format!("/api/v1/users/{}", username))?;
        match self.execute(request).await {
            Ok(user) => Ok(Some(user)),
            Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Create a user account via the admin API. The account is usable
    /// immediately: no forced password change, no notification mail.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, Error> {
        let option = CreateUserOption {
            username,
            email,
            password,
            must_change_password: false,
            send_notify: false,
        };
        let request = self.request(Method::POST, "/api/v1/admin/users")?.json(&option);
        self.execute(request).await
    }

    /// List the OAuth2 applications visible to the current identity.
    pub async fn list_oauth2_apps(&self) -> Result<Vec<OAuth2Application>, Error> {
        let request = self.request(Method::GET, "/api/v1/user/applications/oauth2")?;
        self.execute(request).await
    }

    /// Register a new OAuth2 application. The response carries the
    /// freshly issued client id and secret.
    pub async fn create_oauth2_app(
        &self,
        name: &str,
        redirect_uris: &[String],
    ) -> Result<OAuth2Application, Error> {
        let option = CreateOauth2Option {
            name,
            redirect_uris,
        };
        let request = self
            .request(Method::POST, "/api/v1/user/applications/oauth2")?
            .json(&option);
        self.execute(request).await
    }

    /// Update an existing OAuth2 application in place.
    pub async fn update_oauth2_app(
        &self,
        id: i64,
        name: &str,
        redirect_uris: &[String],
    ) -> Result<OAuth2Application, Error> {
        let option = CreateOauth2Option {
            name,
            redirect_uris,
        };
        let request = self
            .request(
                Method::PATCH,
                &format!("/api/v1/user/applications/oauth2/{}", id),
            )?
            .json(&option);
        self.execute(request).await
    }

    /// Look up a repository; `Ok(None)` if it does not exist.
    pub async fn get_repo(&self, owner: &str, name: &str) -> Result<Option<Repository>, Error> {
        let request = self.request(Method::GET, &format!("/api/v1/repos/{}/{}", owner, name))?;
        match self.execute(request).await {
            Ok(repo) => Ok(Some(repo)),
            Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Clone `clone_addr` server-side into `owner/name`.
    pub async fn migrate_repo(
        &self,
        clone_addr: &str,
        owner: &str,
        name: &str,
    ) -> Result<Repository, Error> {
        let option = MigrateRepoOption {
            clone_addr,
            repo_owner: owner,
            repo_name: name,
        };
        let request = self.request(Method::POST, "/api/v1/repos/migrate")?.json(&option);
        self.execute(request).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, Error> {
        let url = self
            .base_url
            .join(path)
            .map_err(|_| Error::InvalidUrl(format!("{}{}", self.base_url, path)))?;
        debug!("{} {}", method, url);
        let mut builder = self
            .http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .header(header::ACCEPT, "application/json");
        if let Some(sudo) = &self.sudo {
            builder = builder.header("Sudo", sudo);
        }
        Ok(builder)
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, Error> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: message.trim().to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

impl std::fmt::Debug for GiteaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GiteaClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("sudo", &self.sudo)
            .finish_non_exhaustive()
    }
}
