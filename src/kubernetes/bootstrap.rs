// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace and RBAC the addon service account needs in a target cluster

use crate::config::Config;
use crate::constants::OPERATOR_NAME;
use crate::error::{AddonError, Result};
use k8s_openapi::api::core::v1::{Namespace, ServiceAccount};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, PolicyRule, RoleRef, Subject};
use kube::{
    api::{ObjectMeta, Patch, PatchParams},
    Api, Client,
};
use tracing::{info, instrument};

/// Ensure the addon namespace, service account and its cluster-admin binding exist
#[instrument(skip_all, fields(namespace = %config.addon_namespace))]
pub async fn ensure_addon_rbac(client: &Client, config: &Config) -> Result<()> {
    let params = PatchParams::apply(OPERATOR_NAME).force();

    ensure_namespace_exists(client, &config.addon_namespace).await?;

    let service_accounts: Api<ServiceAccount> =
        Api::namespaced(client.clone(), &config.addon_namespace);
    service_accounts
        .patch(
            &config.service_account,
            &params,
            &Patch::Apply(&service_account(config)),
        )
        .await?;

    let roles: Api<ClusterRole> = Api::all(client.clone());
    roles
        .patch(&config.cluster_role, &params, &Patch::Apply(&cluster_role(config)))
        .await?;

    let bindings: Api<ClusterRoleBinding> = Api::all(client.clone());
    bindings
        .patch(
            &config.cluster_role_binding,
            &params,
            &Patch::Apply(&cluster_role_binding(config)),
        )
        .await?;

    info!("Addon service account {} is bound to {}", config.service_account, config.cluster_role);
    Ok(())
}

#[instrument(skip(client))]
pub async fn ensure_namespace_exists(client: &Client, namespace: &str) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let ns = Namespace {
        metadata: ObjectMeta {
            name: Some(namespace.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    namespaces
        .patch(namespace, &PatchParams::apply(OPERATOR_NAME).force(), &Patch::Apply(&ns))
        .await
        .map_err(|e| {
            AddonError::NamespaceError(format!("Failed to apply namespace {}: {}", namespace, e))
        })?;
    Ok(())
}

fn service_account(config: &Config) -> ServiceAccount {
    ServiceAccount {
        metadata: ObjectMeta {
            name: Some(config.service_account.clone()),
            namespace: Some(config.addon_namespace.clone()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn cluster_role(config: &Config) -> ClusterRole {
    ClusterRole {
        metadata: ObjectMeta {
            name: Some(config.cluster_role.clone()),
            ..Default::default()
        },
        rules: Some(vec![PolicyRule {
            api_groups: Some(vec!["*".to_string()]),
            resources: Some(vec!["*".to_string()]),
            verbs: vec!["*".to_string()],
            ..Default::default()
        }]),
        ..Default::default()
    }
}

fn cluster_role_binding(config: &Config) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: ObjectMeta {
            name: Some(config.cluster_role_binding.clone()),
            ..Default::default()
        },
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "ClusterRole".to_string(),
            name: config.cluster_role.clone(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: config.service_account.clone(),
            namespace: Some(config.addon_namespace.clone()),
            ..Default::default()
        }]),
    }
}
