// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Derives names, namespaces and routing mode of the objects backing an addon request.
//!
//! Every function here is a pure function of the request's labels, annotations and
//! namespace, so repeated reconciles always address the same objects.

use crate::config::Config;
use crate::constants::{annotations, labels, DATA_VALUES_SUFFIX};
use crate::error::{AddonError, Result};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tracing::warn;

/// Addon name label of the request, empty when missing
pub fn addon_name(request: &Secret) -> &str {
    label(request, labels::ADDON_NAME)
}

/// Cluster name label of the request, empty when missing
pub fn cluster_name(request: &Secret) -> &str {
    label(request, labels::CLUSTER_NAME)
}

fn label<'a>(request: &'a Secret, key: &str) -> &'a str {
    request
        .metadata
        .labels
        .as_ref()
        .and_then(|l| l.get(key))
        .map(|s| s.as_str())
        .unwrap_or_default()
}

/// True when the addon is deployed through a remote App on this cluster.
///
/// A missing or unparsable annotation resolves to `false`.
pub fn is_remote(request: &Secret) -> bool {
    let Some(value) = request
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(annotations::REMOTE_APP))
    else {
        return false;
    };

    if value.is_empty() {
        return false;
    }

    parse_bool(value).unwrap_or_else(|| {
        warn!(
            "Ignoring unparsable {} annotation {:?} on {}/{}, treating addon as local",
            annotations::REMOTE_APP,
            value,
            request.namespace().unwrap_or_default(),
            request.name_any()
        );
        false
    })
}

/// Boolean spellings accepted by Kubernetes tooling
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// True when the request carries the paused annotation, whatever its value
pub fn is_addon_paused(request: &Secret) -> bool {
    request
        .metadata
        .annotations
        .as_ref()
        .is_some_and(|a| a.contains_key(annotations::PAUSED))
}

/// Name of the App/PackageInstall, `{cluster}-{addon}` when remote.
///
/// Empty when the labels needed to derive it are missing.
pub fn app_name(request: &Secret) -> String {
    let addon = addon_name(request);
    if addon.is_empty() {
        return String::new();
    }

    if is_remote(request) {
        let cluster = cluster_name(request);
        if cluster.is_empty() {
            return String::new();
        }
        return format!("{}-{}", cluster, addon);
    }

    addon.to_string()
}

/// Namespace of the App/PackageInstall: the request's own when remote, else the addon namespace
pub fn app_namespace(request: &Secret, config: &Config) -> String {
    if is_remote(request) {
        request.namespace().unwrap_or_default()
    } else {
        config.addon_namespace.clone()
    }
}

/// Name of the data values secret paired with the App/PackageInstall
pub fn secret_name(request: &Secret) -> String {
    format!("{}{}", app_name(request), DATA_VALUES_SUFFIX)
}

/// Resolved identity of the objects derived from one addon request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonRouting {
    pub addon_name: String,
    pub remote: bool,
    pub app_name: String,
    pub app_namespace: String,
    pub secret_name: String,
}

impl AddonRouting {
    /// Resolve routing, failing instead of yielding empty names
    pub fn resolve(request: &Secret, config: &Config) -> Result<Self> {
        let app_name = app_name(request);
        if app_name.is_empty() {
            return Err(AddonError::UnresolvedRouting(format!(
                "addon request {}/{} is missing the {} or {} label",
                request.namespace().unwrap_or_default(),
                request.name_any(),
                labels::ADDON_NAME,
                labels::CLUSTER_NAME
            )));
        }

        Ok(AddonRouting {
            addon_name: addon_name(request).to_string(),
            remote: is_remote(request),
            secret_name: secret_name(request),
            app_namespace: app_namespace(request, config),
            app_name,
        })
    }
}
