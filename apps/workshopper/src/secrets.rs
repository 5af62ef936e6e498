use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::PostParams;
use kube::{Api, Client};
use tracing::info;

use crate::naming;
use crate::Error;

const DEFAULT_NAMESPACE: &str = "default";

const CLIENT_ID_KEY: &str = "DRONE_GITEA_CLIENT_ID";
const CLIENT_SECRET_KEY: &str = "DRONE_GITEA_CLIENT_SECRET";
const RPC_SECRET_KEY: &str = "DRONE_RPC_SECRET";

fn build_labels() -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        "workshopper".to_string(),
    );
    labels
}

fn target_namespace(namespace: Option<&str>) -> &str {
    match namespace {
        Some(namespace) if !namespace.is_empty() => namespace,
        _ => DEFAULT_NAMESPACE,
    }
}

/// Build the Secret holding an OAuth application's credential pair plus
/// the generated RPC shared secret for the CI component.
pub fn build_oauth_secret(
    app_name: &str,
    namespace: &str,
    client_id: &str,
    client_secret: &str,
    rpc_secret: &str,
) -> Secret {
    let mut string_data = BTreeMap::new();
    string_data.insert(CLIENT_ID_KEY.to_string(), client_id.to_string());
    string_data.insert(CLIENT_SECRET_KEY.to_string(), client_secret.to_string());
    string_data.insert(RPC_SECRET_KEY.to_string(), rpc_secret.to_string());

    Secret {
        metadata: ObjectMeta {
            name: Some(format!("{}-secret", app_name)),
            namespace: Some(namespace.to_string()),
            labels: Some(build_labels()),
            ..Default::default()
        },
        string_data: Some(string_data),
        ..Default::default()
    }
}

/// Store the OAuth credentials as `{app_name}-secret` in the target
/// namespace, creating or replacing as needed. Re-runs are idempotent:
/// the last writer wins.
pub async fn persist_oauth_credential(
    client: Client,
    namespace: Option<&str>,
    app_name: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<(), Error> {
    let namespace = target_namespace(namespace);
    let rpc_secret = naming::random_hex(16)?;
    let secret = build_oauth_secret(app_name, namespace, client_id, client_secret, &rpc_secret);
    let secret_name = format!("{}-secret", app_name);

    let api: Api<Secret> = Api::namespaced(client, namespace);
    match api.get(&secret_name).await {
        Ok(_) => {
            api.replace(&secret_name, &PostParams::default(), &secret)
                .await?;
            info!(
                "Updated Kubernetes secret {} in namespace {}",
                secret_name, namespace
            );
        }
        Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
            api.create(&PostParams::default(), &secret).await?;
            info!(
                "Created Kubernetes secret {} in namespace {}",
                secret_name, namespace
            );
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
