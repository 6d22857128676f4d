// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resolves addon template and container images from the BOM.

use crate::bom::{AddonConfig, ImageCatalog, ImageInfo};
use crate::constants::{bom, DATA_VALUE_HEADER};
use crate::error::{AddonError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Data values document exposing resolved images to ytt templates
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AddonImageInfo {
    #[serde(rename = "imageInfo")]
    pub info: ImageInfoValues,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfoValues {
    pub image_repository: String,
    pub image_pull_policy: String,
    pub images: BTreeMap<String, ImageInfo>,
}

/// Resolve the template image URL of an addon.
///
/// First match wins:
/// 1. the addon's package in the core package repository component,
/// 2. the first `addonTemplatesImage` reference,
/// 3. the legacy `templatesImagePath`/`templatesImageTag` fields.
pub fn resolve_template_image(
    config: &AddonConfig,
    image_repository: &str,
    catalog: &impl ImageCatalog,
) -> Result<String> {
    let image = if !config.package_name.is_empty() {
        lookup(
            catalog,
            bom::CORE_PACKAGE_REPOSITORY_COMPONENT,
            &config.package_name,
        )?
    } else if let Some((component, image_ref)) = config
        .addon_templates_image
        .first()
        .and_then(|c| c.image_refs.first().map(|r| (&c.component_ref, r)))
    {
        lookup(catalog, component, image_ref)?
    } else {
        ImageInfo {
            image_path: config.templates_image_path.clone(),
            tag: config.templates_image_tag.clone(),
        }
    };

    if image.image_path.is_empty() || image.tag.is_empty() {
        return Err(AddonError::ImageResolution(
            "unable to get template image".to_string(),
        ));
    }

    Ok(image_url(image_repository, &image))
}

/// Resolve the imgpkg bundle of the core package repository
pub fn resolve_core_package_repository_image(
    image_repository: &str,
    catalog: &impl ImageCatalog,
) -> Result<String> {
    let image = lookup(
        catalog,
        bom::CORE_PACKAGE_REPOSITORY_COMPONENT,
        bom::CORE_PACKAGE_REPOSITORY_IMAGE,
    )?;
    Ok(image_url(image_repository, &image))
}

/// Resolve every container image of an addon into an `imageInfo` data values document.
///
/// Returns `None` when the addon declares no container images.
pub fn resolve_container_images(
    config: &AddonConfig,
    image_repository: &str,
    image_pull_policy: &str,
    catalog: &impl ImageCatalog,
) -> Result<Option<Vec<u8>>> {
    if config.addon_container_images.is_empty() {
        return Ok(None);
    }

    let mut images = BTreeMap::new();
    for component in &config.addon_container_images {
        for image_ref in &component.image_refs {
            let image = lookup(catalog, &component.component_ref, image_ref)?;
            images.insert(image_ref.clone(), image);
        }
    }

    let document = AddonImageInfo {
        info: ImageInfoValues {
            image_repository: image_repository.to_string(),
            image_pull_policy: image_pull_policy.to_string(),
            images,
        },
    };

    let mut bytes = DATA_VALUE_HEADER.as_bytes().to_vec();
    bytes.extend(serde_yaml::to_string(&document)?.into_bytes());
    Ok(Some(bytes))
}

fn lookup(catalog: &impl ImageCatalog, component: &str, image_ref: &str) -> Result<ImageInfo> {
    catalog.image_info(component, "", image_ref).map_err(|e| {
        AddonError::ImageResolution(format!(
            "image {} of component {}: {}",
            image_ref, component, e
        ))
    })
}

fn image_url(image_repository: &str, image: &ImageInfo) -> String {
    format!("{}/{}:{}", image_repository, image.image_path, image.tag)
}
