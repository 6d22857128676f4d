// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcilers turning an addon request into kapp-controller objects.
//!
//! Two deployment strategies share one capability set: `AppReconciler` always
//! produces a raw App, `PackageReconciler` produces a PackageInstall for local
//! addons and an imgpkg-bundle App for remote ones.

pub mod addon;
pub mod app;
pub mod data_values;
pub mod package;

pub use addon::{AddonReconciler, ReconcileOutcome};
pub use app::AppReconciler;
pub use data_values::DataValuesReconciler;
pub use package::PackageReconciler;

use crate::bom::{AddonConfig, Bom};
use crate::config::Config;
use crate::constants::annotations;
use crate::error::Result;
use crate::routing::AddonRouting;
use crate::store::{ObjectStore, OperationResult};
use crate::types::Cluster;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Everything one normal reconcile of an addon request needs
#[derive(Debug, Clone)]
pub struct AddonContext<'a> {
    pub request: &'a Secret,
    pub routing: AddonRouting,
    /// Cluster owning the addon; remote Apps deploy into it
    pub cluster: &'a Cluster,
    pub addon: &'a AddonConfig,
    pub image_repository: &'a str,
    pub bom: &'a Bom,
}

impl<'a> AddonContext<'a> {
    /// Resolve routing and the addon's BOM entry for a request
    pub fn new(
        request: &'a Secret,
        cluster: &'a Cluster,
        bom: &'a Bom,
        config: &Config,
    ) -> Result<Self> {
        let routing = AddonRouting::resolve(request, config)?;
        let addon = bom.addon_config(&routing.addon_name)?;

        Ok(AddonContext {
            request,
            routing,
            cluster,
            addon,
            image_repository: bom.image_repository(),
            bom,
        })
    }

    /// Annotations linking a derived object back to its request
    pub fn annotations(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                annotations::ADDON_TYPE.to_string(),
                format!("{}/{}", self.addon.category, self.routing.addon_name),
            ),
            (annotations::ADDON_NAME.to_string(), self.request.name_any()),
            (
                annotations::ADDON_NAMESPACE.to_string(),
                self.request.namespace().unwrap_or_default(),
            ),
        ])
    }
}

/// Merge `annotations` into an object's metadata, keeping unrelated ones
pub(crate) fn set_annotations(meta: &mut ObjectMeta, annotations: &BTreeMap<String, String>) {
    meta.annotations
        .get_or_insert_with(BTreeMap::new)
        .extend(annotations.iter().map(|(k, v)| (k.clone(), v.clone())));
}

pub(crate) fn object_meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

/// Operations every deployment strategy provides
#[async_trait]
pub trait AddonStrategy: Send + Sync {
    /// Create or update the desired App/PackageInstall
    async fn reconcile_normal<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
    ) -> Result<OperationResult>;

    /// Delete the desired object; an absent object counts as deleted
    async fn reconcile_delete<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        routing: &AddonRouting,
    ) -> Result<()>;

    /// Create or update the data values secret consumed by the desired object
    async fn reconcile_data_values<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
    ) -> Result<OperationResult>;
}

/// Deployment strategy, chosen once per reconcile
pub enum Strategy {
    App(AppReconciler),
    Package(PackageReconciler),
}

impl Strategy {
    /// Addons shipped as packages go through the packaging API
    pub fn for_addon(config: &Config, addon: &AddonConfig) -> Self {
        if addon.package_name.is_empty() {
            Strategy::App(AppReconciler::new(config.clone()))
        } else {
            Strategy::Package(PackageReconciler::new(config.clone()))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::App(_) => "app",
            Strategy::Package(_) => "package",
        }
    }
}

#[async_trait]
impl AddonStrategy for Strategy {
    async fn reconcile_normal<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
    ) -> Result<OperationResult> {
        match self {
            Strategy::App(r) => r.reconcile_normal(store, ctx).await,
            Strategy::Package(r) => r.reconcile_normal(store, ctx).await,
        }
    }

    async fn reconcile_delete<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        routing: &AddonRouting,
    ) -> Result<()> {
        match self {
            Strategy::App(r) => r.reconcile_delete(store, routing).await,
            Strategy::Package(r) => r.reconcile_delete(store, routing).await,
        }
    }

    async fn reconcile_data_values<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
    ) -> Result<OperationResult> {
        match self {
            Strategy::App(r) => r.reconcile_data_values(store, ctx).await,
            Strategy::Package(r) => r.reconcile_data_values(store, ctx).await,
        }
    }
}
