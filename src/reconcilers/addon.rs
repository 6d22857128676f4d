// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Per-request orchestration of the data values secret and the desired object.

use super::{AddonContext, AddonStrategy, AppReconciler, DataValuesReconciler, PackageReconciler, Strategy};
use crate::bom::Bom;
use crate::config::Config;
use crate::error::Result;
use crate::routing::{is_addon_paused, AddonRouting};
use crate::store::ObjectStore;
use crate::types::Cluster;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tracing::{info, instrument, warn};

/// What a reconcile did with an addon request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Reconciled,
    Deleted,
    Paused,
}

#[derive(Debug, Clone)]
pub struct AddonReconciler {
    config: Config,
}

impl AddonReconciler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bring the data values secret and the desired object in line with `request`
    #[instrument(skip_all, fields(request = %request.name_any(), namespace = %request.namespace().unwrap_or_default()))]
    pub async fn reconcile<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        request: &Secret,
        cluster: &Cluster,
        bom: &Bom,
    ) -> Result<ReconcileOutcome> {
        if is_addon_paused(request) {
            info!("Addon is paused, skipping reconcile");
            return Ok(ReconcileOutcome::Paused);
        }

        let ctx = AddonContext::new(request, cluster, bom, &self.config)?;
        let strategy = Strategy::for_addon(&self.config, ctx.addon);
        info!(
            addon = %ctx.routing.addon_name,
            strategy = strategy.name(),
            remote = ctx.routing.remote,
            "Reconciling addon"
        );

        // The desired object references the secret, so it goes first
        strategy.reconcile_data_values(store, &ctx).await?;
        strategy.reconcile_normal(store, &ctx).await?;

        Ok(ReconcileOutcome::Reconciled)
    }

    /// Remove the desired object and the data values secret of `request`.
    ///
    /// Without a BOM entry for the addon the strategy is unknown, so the objects of
    /// both strategies are removed.
    #[instrument(skip_all, fields(request = %request.name_any(), namespace = %request.namespace().unwrap_or_default()))]
    pub async fn reconcile_delete<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        request: &Secret,
        bom: Option<&Bom>,
    ) -> Result<ReconcileOutcome> {
        let routing = AddonRouting::resolve(request, &self.config)?;

        match bom.and_then(|b| b.addon_config(&routing.addon_name).ok()) {
            Some(addon) => {
                Strategy::for_addon(&self.config, addon)
                    .reconcile_delete(store, &routing)
                    .await?
            }
            None => {
                warn!(addon = %routing.addon_name, "Addon config not found in BOM, deleting objects of every strategy");
                AppReconciler::new(self.config.clone())
                    .reconcile_delete(store, &routing)
                    .await?;
                PackageReconciler::new(self.config.clone())
                    .reconcile_delete(store, &routing)
                    .await?;
            }
        }

        DataValuesReconciler::new(self.config.clone())
            .reconcile_delete(store, &routing)
            .await?;

        Ok(ReconcileOutcome::Deleted)
    }
}
