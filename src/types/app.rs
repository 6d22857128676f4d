// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! kapp-controller App, the raw deployment descriptor.

use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(
    CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema,
)]
#[kube(group = "kappctrl.k14s.io", version = "v1alpha1", kind = "App")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    /// Deploy into another cluster instead of the App's own
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<AppCluster>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fetch: Vec<AppFetch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template: Vec<AppTemplate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deploy: Vec<AppDeploy>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub noop_delete: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_period: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppCluster {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig_secret_ref: Option<KubeconfigSecretKeyRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct KubeconfigSecretKeyRef {
    pub name: String,
    pub key: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppFetch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<FetchImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imgpkg_bundle: Option<FetchImgpkgBundle>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct FetchImage {
    pub url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct FetchImgpkgBundle {
    pub image: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct AppTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ytt: Option<TemplateYtt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kbld: Option<TemplateKbld>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateYtt {
    #[serde(default)]
    pub ignore_unknown_comments: bool,
    #[serde(default)]
    pub strict: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<InlineSource>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InlineSource {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths_from: Vec<InlineSourceRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InlineSourceRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalSecretRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct LocalSecretRef {
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct TemplateKbld {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct AppDeploy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kapp: Option<DeployKapp>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployKapp {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_options: Vec<String>,
}

impl InlineSource {
    /// Inline values read from a single secret
    pub fn from_secret(name: &str) -> Self {
        InlineSource {
            paths_from: vec![InlineSourceRef {
                secret_ref: Some(LocalSecretRef {
                    name: name.to_string(),
                }),
            }],
        }
    }
}
