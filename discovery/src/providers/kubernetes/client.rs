//! Kubernetes REST client and wire types.
//!
//! A plain `reqwest` client as the HTTP seam, with bearer-token auth and an optional
//! custom CA root layered on top.

use super::auth::KubeAuth;
use crate::error::DiscoveryError;
use std::collections::HashMap;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, serde::Deserialize)]
pub(crate) struct PodList {
    #[serde(default)]
    pub items: Vec<Pod>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct Pod {
    pub metadata: PodMetadata,
    pub spec: PodSpec,
    pub status: PodStatus,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct PodMetadata {
    pub name: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct PodSpec {
    #[serde(default)]
    pub containers: Vec<PodContainer>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct PodContainer {
    #[serde(default)]
    pub ports: Vec<ContainerPort>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ContainerPort {
    #[serde(rename = "containerPort")]
    pub container_port: u16,
    pub protocol: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct PodStatus {
    pub phase: Option<String>,
    #[serde(rename = "podIP", default)]
    pub pod_ip: String,
}

pub(crate) struct KubernetesClient {
    http: reqwest::Client,
    auth: KubeAuth,
}

impl KubernetesClient {
    /// Builds the HTTP client: TLS >= 1.2, the kubeconfig's CA PEM as the sole trust root
    /// when present (failure -> `append-ca-failed` sentinel), system roots otherwise, 30s
    /// request timeout.
    pub(crate) fn new(auth: KubeAuth) -> Result<Self, DiscoveryError> {
        let mut builder = reqwest::Client::builder()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .timeout(REQUEST_TIMEOUT);

        if let Some(ca_pem) = &auth.ca_pem {
            let cert = reqwest::Certificate::from_pem(ca_pem.as_bytes())
                .map_err(|e| DiscoveryError::Auth(format!("append-ca-failed: {e}")))?;
            builder = builder.add_root_certificate(cert).tls_built_in_root_certs(false);
        }

        let http = builder
            .build()
            .map_err(|e| DiscoveryError::network("build kubernetes client", e))?;

        Ok(Self { http, auth })
    }

    /// `GET {server}/api/v1/namespaces/{ns}/pods[?labelSelector=...]`.
    pub(crate) async fn list_pods(
        &self,
        namespace: &str,
        label_selector: Option<&str>,
    ) -> Result<Vec<Pod>, DiscoveryError> {
        let mut url = format!("{}/api/v1/namespaces/{}/pods", self.auth.server, namespace);
        if let Some(selector) = label_selector {
            url.push_str("?labelSelector=");
            url.push_str(&url_encode(selector));
        }

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.auth.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| DiscoveryError::network(format!("discover namespace {namespace}"), e))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::network(
                format!("discover namespace {namespace}"),
                format!("unexpected status code {}", response.status()),
            ));
        }

        let body: PodList = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Decode(format!("discover namespace {namespace}: {e}")))?;

        Ok(body.items)
    }
}

fn url_encode(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}
