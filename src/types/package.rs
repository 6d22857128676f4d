// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Carvel packaging API: PackageInstall and PackageRepository.

use crate::types::app::FetchImgpkgBundle;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

#[derive(
    CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema,
)]
#[kube(group = "packaging.carvel.dev", version = "v1alpha1", kind = "PackageInstall")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct PackageInstallSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_ref: Option<PackageRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<PackageInstallValues>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub paused: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageRef {
    pub ref_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_selection: Option<VersionSelectionSemver>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct VersionSelectionSemver {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    /// Present (even empty) to admit pre-release versions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prereleases: Option<Prereleases>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct Prereleases {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageInstallValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<ValuesSecretRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct ValuesSecretRef {
    pub name: String,
}

impl VersionSelectionSemver {
    /// Any version, pre-releases included
    pub fn any_including_prereleases() -> Self {
        VersionSelectionSemver {
            constraints: None,
            prereleases: Some(Prereleases::default()),
        }
    }
}

#[derive(
    CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema,
)]
#[kube(group = "packaging.carvel.dev", version = "v1alpha1", kind = "PackageRepository")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct PackageRepositorySpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch: Option<PackageRepositoryFetch>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageRepositoryFetch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imgpkg_bundle: Option<FetchImgpkgBundle>,
}
