//! Kubernetes auth loading: kubeconfig parsing and the in-cluster fallback.
//!
//! Fallback chain: explicit kubeconfig path, then `$HOME/.kube/config`, then in-cluster
//! service account. Preserving this order matters: inverting it would break developer
//! workstations that happen to have `KUBERNETES_SERVICE_HOST` set by accident.

use crate::error::DiscoveryError;
use fleetwatch_shared::os::env_var::EnvVarQuery;
use std::path::{Path, PathBuf};

/// Resolved Kubernetes API access: a server URL, a bearer token, and an optional CA PEM.
///
/// `ca_pem`, when present, is stored exactly as read from the kubeconfig's
/// `certificate-authority-data` field **without base64-decoding** it. Real kubeconfigs
/// base64-encode this field, so this only round-trips against fixtures that store the PEM
/// literally. This is a deliberate simplification, kept as-is rather than "corrected".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeAuth {
    pub server: String,
    pub token: String,
    pub ca_pem: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct Kubeconfig {
    #[serde(rename = "current-context")]
    current_context: Option<String>,
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Debug, serde::Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ClusterDetail {
    server: String,
    #[serde(rename = "certificate-authority-data")]
    certificate_authority_data: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct NamedContext {
    name: String,
    context: ContextDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ContextDetail {
    cluster: String,
    user: String,
}

#[derive(Debug, serde::Deserialize)]
struct NamedUser {
    name: String,
    user: UserDetail,
}

#[derive(Debug, serde::Deserialize)]
struct UserDetail {
    token: Option<String>,
}

/// Parses a simplified kubeconfig YAML document and resolves `current-context` down to
/// a concrete [`KubeAuth`]. Sentinel errors: `no-context`, `context-not-found`,
/// `cluster-not-found`, `user-not-found`.
fn parse_kubeconfig(contents: &str) -> Result<KubeAuth, DiscoveryError> {
    let config: Kubeconfig =
        serde_yaml::from_str(contents).map_err(|e| DiscoveryError::config("parse kubeconfig", e))?;

    let current_context = config
        .current_context
        .filter(|c| !c.is_empty())
        .ok_or_else(|| DiscoveryError::Config("no-context".to_string()))?;

    let context_entry = config
        .contexts
        .iter()
        .find(|c| c.name == current_context)
        .ok_or_else(|| DiscoveryError::Config("context-not-found".to_string()))?;

    let cluster_entry = config
        .clusters
        .iter()
        .find(|c| c.name == context_entry.context.cluster)
        .ok_or_else(|| DiscoveryError::Config("cluster-not-found".to_string()))?;

    let user_entry = config
        .users
        .iter()
        .find(|u| u.name == context_entry.context.user)
        .ok_or_else(|| DiscoveryError::Config("user-not-found".to_string()))?;

    Ok(KubeAuth {
        server: cluster_entry.cluster.server.clone(),
        token: user_entry.user.token.clone().unwrap_or_default(),
        ca_pem: cluster_entry.cluster.certificate_authority_data.clone(),
    })
}

const IN_CLUSTER_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const IN_CLUSTER_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

fn load_in_cluster(env: &dyn EnvVarQuery) -> Result<KubeAuth, DiscoveryError> {
    let host = env
        .get_env_var("KUBERNETES_SERVICE_HOST")
        .map_err(|_| DiscoveryError::config("in-cluster auth", "KUBERNETES_SERVICE_HOST not set"))?;
    let port = env
        .get_env_var("KUBERNETES_SERVICE_PORT")
        .map_err(|_| DiscoveryError::config("in-cluster auth", "KUBERNETES_SERVICE_PORT not set"))?;

    let token = std::fs::read_to_string(IN_CLUSTER_TOKEN_PATH)
        .map_err(|e| DiscoveryError::config("read service account token", e))?
        .trim()
        .to_string();
    let ca_pem = std::fs::read_to_string(IN_CLUSTER_CA_PATH).ok();

    Ok(KubeAuth {
        server: format!("https://{host}:{port}"),
        token,
        ca_pem,
    })
}

/// Resolves Kubernetes auth following the explicit-path -> `$HOME/.kube/config` ->
/// in-cluster fallback chain.
pub fn load_auth(
    explicit_path: Option<&Path>,
    env: &dyn EnvVarQuery,
) -> Result<KubeAuth, DiscoveryError> {
    if let Some(path) = explicit_path {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DiscoveryError::config(format!("read kubeconfig {}", path.display()), e))?;
        return parse_kubeconfig(&contents);
    }

    if let Ok(home) = env.get_env_var("HOME") {
        let default_path: PathBuf = Path::new(&home).join(".kube/config");
        if default_path.exists() {
            let contents = std::fs::read_to_string(&default_path)
                .map_err(|e| DiscoveryError::config(format!("read kubeconfig {}", default_path.display()), e))?;
            return parse_kubeconfig(&contents);
        }
    }

    load_in_cluster(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch_shared::os::env_var::MockEnvVarQuery;

    const FIXTURE: &str = r#"
current-context: default
clusters:
  - name: default-cluster
    cluster:
      server: https://10.0.0.1:6443
      certificate-authority-data: LS0tLS1CRUdJTi0tLS0t
contexts:
  - name: default
    context:
      cluster: default-cluster
      user: default-user
users:
  - name: default-user
    user:
      token: s3cr3t
"#;

    #[test]
    fn parses_current_context_end_to_end() {
        let auth = parse_kubeconfig(FIXTURE).unwrap();
        assert_eq!(auth.server, "https://10.0.0.1:6443");
        assert_eq!(auth.token, "s3cr3t");
        assert_eq!(auth.ca_pem.as_deref(), Some("LS0tLS1CRUdJTi0tLS0t"));
    }

    #[test]
    fn missing_current_context_is_no_context_sentinel() {
        let yaml = "clusters: []\ncontexts: []\nusers: []\n";
        let err = parse_kubeconfig(yaml).unwrap_err();
        assert!(matches!(err, DiscoveryError::Config(ref s) if s == "no-context"));
    }

    #[test]
    fn unresolvable_cluster_is_cluster_not_found_sentinel() {
        let yaml = r#"
current-context: default
clusters:
  - name: other-cluster
    cluster:
      server: https://x
contexts:
  - name: default
    context:
      cluster: nonexistent-cluster
      user: default-user
users:
  - name: default-user
    user:
      token: t
"#;
        let err = parse_kubeconfig(yaml).unwrap_err();
        assert!(matches!(err, DiscoveryError::Config(ref s) if s == "cluster-not-found"));
    }

    #[test]
    fn in_cluster_requires_both_env_vars() {
        let mut env = MockEnvVarQuery::new();
        env.expect_get_env_var()
            .withf(|name| name == &"KUBERNETES_SERVICE_HOST")
            .returning(|_| Err(std::env::VarError::NotPresent));
        let err = load_in_cluster(&env).unwrap_err();
        assert!(matches!(err, DiscoveryError::Config(_)));
    }
}
