// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Workload cluster client creation from Cluster API kubeconfig secrets

use crate::config::Config;
use crate::error::{AddonError, Result};
use crate::types::Cluster;
use k8s_openapi::api::core::v1::Secret;
use kube::{config::KubeConfigOptions, Api, Client, Config as KConfig, ResourceExt};
use tracing::{debug, info, instrument};

/// Create a Kubernetes client for the workload cluster of `cluster`
#[instrument(skip(management_client, cluster, config), fields(cluster = %cluster.name_any()))]
pub async fn create_workload_client(
    management_client: &Client,
    cluster: &Cluster,
    config: &Config,
) -> Result<Client> {
    if config.testing_mode {
        create_testing_client().await
    } else {
        let kubeconfig = get_cluster_kubeconfig(management_client, cluster).await?;
        create_client_from_kubeconfig(&kubeconfig).await
    }
}

/// In testing mode every workload cluster is the cluster KUBECONFIG points at
async fn create_testing_client() -> Result<Client> {
    let c = KConfig::infer()
        .await
        .map_err(|e| AddonError::KubeconfigError(format!("Failed to infer config: {}", e)))?;
    debug!("Testing mode: using inferred cluster {}", c.cluster_url);

    Client::try_from(c)
        .map_err(|e| AddonError::KubeconfigError(format!("Failed to create client: {}", e)))
}

/// Read the admin kubeconfig Cluster API stores next to the cluster
#[instrument(skip(client, cluster), fields(cluster = %cluster.name_any()))]
pub async fn get_cluster_kubeconfig(client: &Client, cluster: &Cluster) -> Result<String> {
    let cluster_name = cluster.name_any();
    let secret_ref = cluster.kubeconfig_secret_ref();
    let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());
    let secrets: Api<Secret> = Api::namespaced(client.clone(), &namespace);

    info!(
        "Getting kubeconfig secret '{}/{}' for cluster '{}'...",
        namespace, secret_ref.name, cluster_name
    );

    let secret = secrets.get(&secret_ref.name).await.map_err(|e| {
        AddonError::KubeconfigError(format!(
            "Failed to get kubeconfig secret for cluster {}: {}",
            cluster_name, e
        ))
    })?;

    let Some(kubeconfig_data) = secret.data.as_ref().and_then(|d| d.get(&secret_ref.key)) else {
        return Err(AddonError::KubeconfigError(format!(
            "Kubeconfig secret for cluster {} does not contain '{}' key",
            cluster_name, secret_ref.key
        )));
    };

    String::from_utf8(kubeconfig_data.0.clone()).map_err(|e| {
        AddonError::KubeconfigError(format!(
            "Failed to decode kubeconfig for cluster {}: {}",
            cluster_name, e
        ))
    })
}

async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    use kube::config::Kubeconfig;

    let kubeconfig_parsed: Kubeconfig = serde_yaml::from_str(kubeconfig)
        .map_err(|e| AddonError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))?;

    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig_parsed, &KubeConfigOptions::default())
            .await
            .map_err(|e| AddonError::KubeconfigError(format!("Failed to create config: {}", e)))?;

    Client::try_from(client_config)
        .map_err(|e| AddonError::KubeconfigError(format!("Failed to create client: {}", e)))
}
