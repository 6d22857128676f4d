// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Data values secret paired with every App/PackageInstall.

use super::{object_meta, AddonContext};
use crate::config::Config;
use crate::constants::{DATA_VALUE_ANNOTATIONS, DOCUMENT_SEPARATOR, IMAGE_INFO_KEY};
use crate::error::Result;
use crate::images::resolve_container_images;
use crate::routing::AddonRouting;
use crate::store::{create_or_update, delete_if_exists, log_operation_result, ObjectStore, OperationResult};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct DataValuesReconciler {
    config: Config,
}

impl DataValuesReconciler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Payload of the data values secret.
    ///
    /// A copy of the request's data, optionally stripped of ytt annotation lines,
    /// plus an `imageInfo.yaml` document when the addon declares container images.
    pub fn build_data(
        &self,
        ctx: &AddonContext<'_>,
        strip_annotations: bool,
    ) -> Result<BTreeMap<String, ByteString>> {
        let mut data: BTreeMap<String, ByteString> = ctx
            .request
            .data
            .iter()
            .flatten()
            .map(|(k, v)| {
                let value = if strip_annotations {
                    ByteString(trim_data_value_annotations(&v.0))
                } else {
                    v.clone()
                };
                (k.clone(), value)
            })
            .collect();

        if let Some(image_info) = resolve_container_images(
            ctx.addon,
            ctx.image_repository,
            &self.config.image_pull_policy,
            ctx.bom,
        )? {
            data.insert(IMAGE_INFO_KEY.to_string(), ByteString(image_info));
        }

        Ok(data)
    }

    #[instrument(skip(self, store, ctx), fields(secret = %ctx.routing.secret_name, namespace = %ctx.routing.app_namespace))]
    pub async fn reconcile_normal<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
        strip_annotations: bool,
    ) -> Result<OperationResult> {
        let data = self.build_data(ctx, strip_annotations).inspect_err(|e| {
            error!("Error retrieving addon image info: {}", e);
        })?;

        let secret = Secret {
            metadata: object_meta(&ctx.routing.secret_name, &ctx.routing.app_namespace),
            ..Default::default()
        };

        let result = create_or_update(store, secret, |s: &mut Secret| {
            s.type_ = Some("Opaque".to_string());
            s.data = Some(data.clone());
            s.string_data = None;
        })
        .await
        .inspect_err(|e| error!("Error creating or updating addon data values secret: {}", e))?;

        log_operation_result("addon data values secret", &ctx.routing.secret_name, result);
        Ok(result)
    }

    #[instrument(skip(self, store, routing), fields(secret = %routing.secret_name, namespace = %routing.app_namespace))]
    pub async fn reconcile_delete<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        routing: &AddonRouting,
    ) -> Result<()> {
        if delete_if_exists::<Secret, _>(store, &routing.secret_name, &routing.app_namespace).await? {
            info!("Deleted addon data values secret");
        } else {
            info!("Addon data values secret not found");
        }
        Ok(())
    }
}

/// Drop the leading ytt data values header the packaging values schema does not accept.
///
/// Only annotation lines before the first document and the separator closing them are
/// removed. The rest of the value is kept byte for byte.
pub fn trim_data_value_annotations(value: &[u8]) -> Vec<u8> {
    let mut in_header = true;
    value
        .split_inclusive(|b| *b == b'\n')
        .filter(|line| {
            if !in_header {
                return true;
            }
            let line = line.trim_ascii();
            if line.is_empty() {
                return true;
            }
            if DATA_VALUE_ANNOTATIONS
                .iter()
                .any(|annotation| line == annotation.as_bytes())
            {
                return false;
            }
            // The first separator closes the header, later ones split documents
            in_header = false;
            line != DOCUMENT_SEPARATOR.as_bytes()
        })
        .flatten()
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::Bom;
    use crate::constants::DATA_VALUE_HEADER;
    use crate::test_utils::{addon_request, cluster, MemoryStore, StoreCall};

    const VALUES: &[u8] =
        b"#@data/values\n#@overlay/match-child-defaults missing_ok=True\n---\nantrea:\n  config:\n    serviceCidr: 100.64.0.0/13\n";

    #[test]
    fn test_trim_removes_annotation_lines_only() {
        let trimmed = trim_data_value_annotations(VALUES);
        assert_eq!(
            String::from_utf8(trimmed).unwrap(),
            "antrea:\n  config:\n    serviceCidr: 100.64.0.0/13\n"
        );
    }

    #[test]
    fn test_trim_keeps_other_comments() {
        let value = b"#! regular comment\nkey: value --- not a separator\n#@ load(\"@ytt:data\", \"data\")\n";
        assert_eq!(trim_data_value_annotations(value), value.to_vec());
    }

    #[test]
    fn test_trim_without_trailing_newline() {
        assert_eq!(
            trim_data_value_annotations(b"#@data/values\n---"),
            Vec::<u8>::new()
        );
        assert_eq!(trim_data_value_annotations(b"a: 1\n---"), b"a: 1\n---".to_vec());
    }

    #[test]
    fn test_trim_keeps_later_document_separators() {
        let value = b"#@data/values\n---\na: 1\n---\nb: 2\n";
        assert_eq!(
            String::from_utf8(trim_data_value_annotations(value)).unwrap(),
            "a: 1\n---\nb: 2\n"
        );
    }

    #[test]
    fn test_trim_leaves_annotations_after_header() {
        let value = b"a: 1\n---\n#@data/values\nb: 2\n";
        assert_eq!(trim_data_value_annotations(value), value.to_vec());
    }

    #[tokio::test]
    async fn test_app_secret_keeps_annotations_and_adds_image_info() {
        let config = Config::default();
        let bom = Bom::from_yaml(crate::test_utils::TEST_BOM).unwrap();
        let request = addon_request("test-cluster-1-antrea", "default", "antrea", "test-cluster-1");
        let cluster = cluster("test-cluster-1", "default");
        let ctx = AddonContext::new(&request, &cluster, &bom, &config).unwrap();
        let store = MemoryStore::new();

        let result = DataValuesReconciler::new(config)
            .reconcile_normal(&store, &ctx, false)
            .await
            .unwrap();

        assert_eq!(result, OperationResult::Created);
        let secret: Secret = store.object("antrea-data-values", "tkg-system").unwrap();
        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
        let data = secret.data.unwrap();
        assert_eq!(data["values.yaml"].0, VALUES.to_vec());

        let image_info = String::from_utf8(data[IMAGE_INFO_KEY].0.clone()).unwrap();
        assert!(image_info.starts_with(DATA_VALUE_HEADER));
        assert!(image_info.contains("imageRepository: projects.registry.vmware.com/tkg"));
        assert!(image_info.contains("imagePath: antrea/antrea-debian"));
        assert!(image_info.contains("tag: v0.11.3_vmware.2"));
    }

    #[tokio::test]
    async fn test_package_secret_strips_annotations() {
        let config = Config::default();
        let bom = Bom::from_yaml(crate::test_utils::TEST_BOM).unwrap();
        let request = addon_request("c-antrea", "default", "antrea-package", "c");
        let cluster = cluster("c", "default");
        let ctx = AddonContext::new(&request, &cluster, &bom, &config).unwrap();
        let store = MemoryStore::new();

        DataValuesReconciler::new(config)
            .reconcile_normal(&store, &ctx, true)
            .await
            .unwrap();

        let secret: Secret = store
            .object("antrea-package-data-values", "tkg-system")
            .unwrap();
        let values = String::from_utf8(secret.data.unwrap()["values.yaml"].0.clone()).unwrap();
        assert!(!values.contains("#@data/values"));
        assert!(!values.contains("---"));
        assert!(values.contains("serviceCidr: 100.64.0.0/13"));
    }

    #[tokio::test]
    async fn test_second_reconcile_is_unchanged() {
        let config = Config::default();
        let bom = Bom::from_yaml(crate::test_utils::TEST_BOM).unwrap();
        let request = addon_request("c-antrea", "default", "antrea", "c");
        let cluster = cluster("c", "default");
        let ctx = AddonContext::new(&request, &cluster, &bom, &config).unwrap();
        let store = MemoryStore::new();
        let reconciler = DataValuesReconciler::new(config);

        let first = reconciler.reconcile_normal(&store, &ctx, false).await.unwrap();
        let second = reconciler.reconcile_normal(&store, &ctx, false).await.unwrap();

        assert_eq!(first, OperationResult::Created);
        assert_eq!(second, OperationResult::Unchanged);
    }

    #[tokio::test]
    async fn test_stale_keys_are_removed() {
        let config = Config::default();
        let bom = Bom::from_yaml(crate::test_utils::TEST_BOM).unwrap();
        let request = addon_request("c-antrea", "default", "antrea", "c");
        let cluster = cluster("c", "default");
        let ctx = AddonContext::new(&request, &cluster, &bom, &config).unwrap();
        let store = MemoryStore::new();
        let mut existing = Secret {
            metadata: object_meta("antrea-data-values", "tkg-system"),
            ..Default::default()
        };
        existing.data = Some(BTreeMap::from([(
            "old.yaml".to_string(),
            ByteString(b"x: 1".to_vec()),
        )]));
        store.insert(&existing);

        let result = DataValuesReconciler::new(config)
            .reconcile_normal(&store, &ctx, false)
            .await
            .unwrap();

        assert_eq!(result, OperationResult::Updated);
        let secret: Secret = store.object("antrea-data-values", "tkg-system").unwrap();
        assert!(!secret.data.unwrap().contains_key("old.yaml"));
    }

    #[tokio::test]
    async fn test_image_failure_aborts_before_any_write() {
        let config = Config::default();
        let mut bom = Bom::from_yaml(crate::test_utils::TEST_BOM).unwrap();
        bom.components.remove("antrea");
        let request = addon_request("c-antrea", "default", "antrea", "c");
        let cluster = cluster("c", "default");
        let ctx = AddonContext::new(&request, &cluster, &bom, &config).unwrap();
        let store = MemoryStore::new();

        let result = DataValuesReconciler::new(config)
            .reconcile_normal(&store, &ctx, false)
            .await;

        assert!(result.is_err());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let config = Config::default();
        let request = addon_request("c-antrea", "default", "antrea", "c");
        let routing = AddonRouting::resolve(&request, &config).unwrap();
        let store = MemoryStore::new();
        store.insert(&Secret {
            metadata: object_meta("antrea-data-values", "tkg-system"),
            ..Default::default()
        });
        let reconciler = DataValuesReconciler::new(config);

        reconciler.reconcile_delete(&store, &routing).await.unwrap();
        reconciler.reconcile_delete(&store, &routing).await.unwrap();

        assert_eq!(
            store.writes(),
            vec![
                StoreCall::new("delete", "Secret", "tkg-system", "antrea-data-values"),
                StoreCall::new("delete", "Secret", "tkg-system", "antrea-data-values"),
            ]
        );
        assert!(store.object::<Secret>("antrea-data-values", "tkg-system").is_none());
    }
}
