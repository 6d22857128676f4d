// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Addon controller - watches addon request secrets and reconciles their derived objects.

use crate::bom::Bom;
use crate::config::Config;
use crate::constants::{ADDON_SECRET_TYPE, FINALIZER};
use crate::error::{AddonError, Result};
use crate::kubernetes::{create_workload_client, ensure_addon_rbac};
use crate::reconcilers::AddonReconciler;
use crate::routing::{cluster_name, is_addon_paused, is_remote};
use crate::store::KubeStore;
use crate::types::Cluster;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::{
    runtime::{
        controller::Action,
        finalizer::{finalizer, Event as Finalizer},
        Controller,
    },
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub struct AddonController {
    client: Client,
    config: Config,
    reconciler: AddonReconciler,
}

impl AddonController {
    pub fn new(client: Client, config: Config) -> Self {
        let reconciler = AddonReconciler::new(config.clone());
        Self {
            client,
            config,
            reconciler,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let secrets: Api<Secret> = Api::all(self.client.clone());
        let watcher_config = WatcherConfig::default().fields(&format!("type={}", ADDON_SECRET_TYPE));
        let context = Arc::new(self);

        info!("Starting addon controller");

        Controller::new(secrets, watcher_config)
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled addon secret: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Read the BOM from its ConfigMap
    #[instrument(skip(self), fields(config_map = %self.config.bom_config_map))]
    pub async fn load_bom(&self) -> Result<Bom> {
        let config_maps: Api<ConfigMap> =
            Api::namespaced(self.client.clone(), &self.config.bom_namespace);
        let cm = config_maps.get(&self.config.bom_config_map).await?;
        Bom::from_config_map(&cm)
    }

    async fn get_cluster(&self, request: &Secret) -> Result<Option<Cluster>> {
        let name = cluster_name(request);
        if name.is_empty() {
            return Err(AddonError::UnresolvedRouting(format!(
                "addon request {} has no cluster name label",
                request.name_any()
            )));
        }

        let namespace = request.namespace().unwrap_or_default();
        let clusters: Api<Cluster> = Api::namespaced(self.client.clone(), &namespace);
        Ok(clusters.get_opt(name).await?)
    }

    /// Remote Apps live next to the request, everything else in the workload cluster
    async fn store_for(&self, request: &Secret, cluster: &Cluster) -> Result<KubeStore> {
        if is_remote(request) {
            return Ok(KubeStore::new(self.client.clone()));
        }

        let workload = create_workload_client(&self.client, cluster, &self.config).await?;
        Ok(KubeStore::new(workload))
    }

    #[instrument(skip_all, fields(request = %request.name_any()))]
    async fn apply(&self, request: &Secret) -> Result<Action> {
        if is_addon_paused(request) {
            info!("Addon is paused, skipping");
            return Ok(Action::await_change());
        }

        let bom = self.load_bom().await?;
        let Some(cluster) = self.get_cluster(request).await? else {
            warn!(cluster = cluster_name(request), "Cluster not found, retrying later");
            return Ok(Action::requeue(Duration::from_secs(60)));
        };

        if !is_remote(request) && !cluster.is_ready() {
            info!(cluster = %cluster.name_any(), "Workload cluster not ready yet, retrying later");
            return Ok(Action::requeue(Duration::from_secs(60)));
        }

        let store = self.store_for(request, &cluster).await?;
        if !is_remote(request) {
            ensure_addon_rbac(store.client(), &self.config).await?;
        }

        let outcome = self
            .reconciler
            .reconcile(&store, request, &cluster, &bom)
            .await?;
        debug!("Addon reconcile outcome: {:?}", outcome);

        Ok(Action::requeue(self.config.app_sync_period))
    }

    #[instrument(skip_all, fields(request = %request.name_any()))]
    async fn cleanup(&self, request: &Secret) -> Result<Action> {
        let bom = self
            .load_bom()
            .await
            .inspect_err(|e| warn!("BOM unavailable during addon deletion: {}", e))
            .ok();

        let store = if is_remote(request) {
            KubeStore::new(self.client.clone())
        } else {
            match self.get_cluster(request).await? {
                Some(cluster) => self.store_for(request, &cluster).await?,
                None => {
                    info!("Cluster is gone, nothing left to clean up");
                    return Ok(Action::await_change());
                }
            }
        };

        let outcome = self
            .reconciler
            .reconcile_delete(&store, request, bom.as_ref())
            .await?;
        info!("Addon cleanup finished: {:?}", outcome);

        Ok(Action::await_change())
    }
}

async fn reconcile(request: Arc<Secret>, ctx: Arc<AddonController>) -> Result<Action> {
    let Some(namespace) = request.namespace() else {
        return Err(AddonError::UnresolvedRouting(format!(
            "addon request {} has no namespace",
            request.name_any()
        )));
    };

    debug!("Reconciling addon secret: {}/{}", namespace, request.name_any());

    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), &namespace);
    finalizer(&secrets, FINALIZER, request, |event| async {
        match event {
            Finalizer::Apply(request) => ctx.apply(&request).await,
            Finalizer::Cleanup(request) => ctx.cleanup(&request).await,
        }
    })
    .await
    .map_err(|e| AddonError::Finalizer(e.to_string()))
}

fn error_policy(_request: Arc<Secret>, error: &AddonError, _ctx: Arc<AddonController>) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(Duration::from_secs(60))
}
