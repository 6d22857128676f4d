// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bill of Materials: versioned component images and per-addon configuration.

use crate::constants::bom::CONFIG_MAP_KEY;
use crate::error::{AddonError, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolves (component, version, image ref) to a concrete image.
///
/// An empty `version` selects the first listed version of the component.
pub trait ImageCatalog {
    fn image_info(&self, component: &str, version: &str, image_ref: &str) -> Result<ImageInfo>;
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub image_path: String,
    pub tag: String,
}

/// Points at a BOM component and images within it
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentReference {
    pub component_ref: String,
    #[serde(default)]
    pub image_refs: Vec<String>,
}

/// Addon section of the BOM, e.g.
///
/// ```yaml
/// antrea:
///   category: cni
///   packageName: antrea.tanzu.vmware.com
///   templatesImagePath: tanzu_core/addons/antrea-templates
///   templatesImageTag: v1.3.1
///   addonTemplatesImage:
///   - componentRef: tanzu_core_addons
///     imageRefs: [antreaTemplatesImage]
///   addonContainerImages:
///   - componentRef: antrea
///     imageRefs: [antreaImage]
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddonConfig {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub cluster_types: Vec<String>,
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub templates_image_path: String,
    #[serde(default)]
    pub templates_image_tag: String,
    #[serde(default)]
    pub addon_templates_image: Vec<ComponentReference>,
    #[serde(default)]
    pub addon_container_images: Vec<ComponentReference>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    pub version: String,
    #[serde(default)]
    pub images: BTreeMap<String, ImageInfo>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub image_repository: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Bom {
    #[serde(default)]
    pub image_config: ImageConfig,
    #[serde(default)]
    pub components: BTreeMap<String, Vec<ComponentInfo>>,
    #[serde(default)]
    pub addons: BTreeMap<String, AddonConfig>,
}

impl Bom {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| AddonError::Bom(format!("Failed to parse BOM: {}", e)))
    }

    /// Read the BOM document from its ConfigMap
    pub fn from_config_map(cm: &ConfigMap) -> Result<Self> {
        let Some(content) = cm.data.as_ref().and_then(|d| d.get(CONFIG_MAP_KEY)) else {
            return Err(AddonError::Bom(format!(
                "ConfigMap {} does not contain '{}' key",
                cm.name_any(),
                CONFIG_MAP_KEY
            )));
        };
        Self::from_yaml(content)
    }

    pub fn image_repository(&self) -> &str {
        &self.image_config.image_repository
    }

    pub fn addon_config(&self, addon_name: &str) -> Result<&AddonConfig> {
        self.addons
            .get(addon_name)
            .ok_or_else(|| AddonError::AddonConfigNotFound(addon_name.to_string()))
    }
}

impl ImageCatalog for Bom {
    fn image_info(&self, component: &str, version: &str, image_ref: &str) -> Result<ImageInfo> {
        let Some(versions) = self.components.get(component) else {
            return Err(AddonError::Bom(format!("unable to find component {}", component)));
        };

        let Some(info) = versions
            .iter()
            .find(|c| version.is_empty() || c.version == version)
        else {
            return Err(AddonError::Bom(format!(
                "unable to find version {:?} of component {}",
                version, component
            )));
        };

        info.images.get(image_ref).cloned().ok_or_else(|| {
            AddonError::Bom(format!(
                "unable to find image {} in component {}",
                image_ref, component
            ))
        })
    }
}
