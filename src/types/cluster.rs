// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::kubeconfig;
use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};

/// Cluster API cluster, the target of remote Apps
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "cluster.x-k8s.io", version = "v1beta1", kind = "Cluster")]
#[kube(namespaced)]
#[kube(status = "ClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
}

/// Location of a cluster's admin kubeconfig
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KubeconfigSecretRef {
    pub name: String,
    pub key: String,
}

impl Cluster {
    /// Check if this cluster is ready based on its status conditions
    pub fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .is_some_and(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.condition_type == "Ready" && c.status == "True")
            })
    }

    /// Kubeconfig secret written by Cluster API for this cluster
    pub fn kubeconfig_secret_ref(&self) -> KubeconfigSecretRef {
        KubeconfigSecretRef {
            name: format!("{}{}", self.name_any(), kubeconfig::SECRET_SUFFIX),
            key: kubeconfig::SECRET_KEY.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane_ready: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Condition>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    fn make_cluster(name: &str, status: Option<ClusterStatus>) -> Cluster {
        Cluster {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: ClusterSpec::default(),
            status,
        }
    }

    fn make_condition(condition_type: &str, status: &str) -> Condition {
        Condition {
            condition_type: condition_type.to_string(),
            status: status.to_string(),
            message: None,
        }
    }

    #[test]
    fn test_is_ready_with_ready_condition() {
        let cluster = make_cluster(
            "test-cluster",
            Some(ClusterStatus {
                conditions: Some(vec![
                    make_condition("ControlPlaneReady", "True"),
                    make_condition("Ready", "True"),
                ]),
                ..Default::default()
            }),
        );

        assert!(cluster.is_ready());
    }

    #[test]
    fn test_is_ready_with_not_ready_condition() {
        let cluster = make_cluster(
            "test-cluster",
            Some(ClusterStatus {
                conditions: Some(vec![make_condition("Ready", "False")]),
                ..Default::default()
            }),
        );

        assert!(!cluster.is_ready());
    }

    #[test]
    fn test_is_ready_with_no_status() {
        let cluster = make_cluster("test-cluster", None);
        assert!(!cluster.is_ready());
    }

    #[test]
    fn test_kubeconfig_secret_ref() {
        let cluster = make_cluster("test-cluster-2", None);
        let secret_ref = cluster.kubeconfig_secret_ref();

        assert_eq!(secret_ref.name, "test-cluster-2-kubeconfig");
        assert_eq!(secret_ref.key, "value");
    }
}
