// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! App strategy: deploys every addon through a raw kapp-controller App.

use super::{object_meta, set_annotations, AddonContext, AddonStrategy, DataValuesReconciler};
use crate::config::{format_duration, Config};
use crate::error::Result;
use crate::images::resolve_template_image;
use crate::routing::AddonRouting;
use crate::store::{create_or_update, delete_if_exists, log_operation_result, ObjectStore, OperationResult};
use crate::types::app::{
    AppCluster, AppDeploy, AppFetch, AppTemplate, DeployKapp, FetchImage, InlineSource,
    KubeconfigSecretKeyRef, TemplateYtt,
};
use crate::types::{App, AppSpec};
use async_trait::async_trait;
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct AppReconciler {
    config: Config,
}

impl AppReconciler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Desired App spec: template image fetched, rendered by ytt with the data values secret
    pub fn desired_spec(&self, ctx: &AddonContext<'_>) -> Result<AppSpec> {
        let template_image_url = resolve_template_image(ctx.addon, ctx.image_repository, ctx.bom)
            .inspect_err(|e| error!("Error getting addon template image: {}", e))?;
        info!(image_url = %template_image_url, "Addon template image found");

        let mut spec = base_app_spec(&self.config, ctx);
        spec.fetch = vec![AppFetch {
            image: Some(FetchImage {
                url: template_image_url,
            }),
            ..Default::default()
        }];
        spec.template = vec![AppTemplate {
            ytt: Some(TemplateYtt {
                ignore_unknown_comments: true,
                strict: false,
                paths: vec![],
                inline: Some(InlineSource::from_secret(&ctx.routing.secret_name)),
            }),
            ..Default::default()
        }];
        Ok(spec)
    }
}

/// Fields shared by every App this operator writes: identity, sync period, deploy
/// options and delete behaviour
pub(crate) fn base_app_spec(config: &Config, ctx: &AddonContext<'_>) -> AppSpec {
    let remote = ctx.routing.remote;

    // Remote Apps are reconciled here but deploy into the workload cluster through its kubeconfig
    let (service_account_name, cluster) = if remote {
        let secret_ref = ctx.cluster.kubeconfig_secret_ref();
        (
            None,
            Some(AppCluster {
                kubeconfig_secret_ref: Some(KubeconfigSecretKeyRef {
                    name: secret_ref.name,
                    key: secret_ref.key,
                }),
            }),
        )
    } else {
        (Some(config.service_account.clone()), None)
    };

    AppSpec {
        service_account_name,
        cluster,
        sync_period: Some(format_duration(config.app_sync_period)),
        // An App may wait on another App's deployment, so bound the wait
        deploy: vec![AppDeploy {
            kapp: Some(DeployKapp {
                raw_options: vec![format!(
                    "--wait-timeout={}",
                    format_duration(config.app_wait_timeout)
                )],
            }),
        }],
        // The workload outlives the remote App, e.g. while its cluster is being deleted
        noop_delete: remote,
        ..Default::default()
    }
}

/// Upsert an App, owning every field of `spec` except `paused`
pub(crate) async fn apply_app<S: ObjectStore + ?Sized>(
    store: &S,
    ctx: &AddonContext<'_>,
    spec: AppSpec,
) -> Result<OperationResult> {
    let annotations = ctx.annotations();
    let app = App {
        metadata: object_meta(&ctx.routing.app_name, &ctx.routing.app_namespace),
        spec: AppSpec::default(),
    };

    let result = create_or_update(store, app, |app: &mut App| {
        set_annotations(&mut app.metadata, &annotations);
        let paused = app.spec.paused;
        app.spec = AppSpec {
            paused,
            ..spec.clone()
        };
    })
    .await
    .inspect_err(|e| error!("Error creating or updating addon App: {}", e))?;

    log_operation_result("app", &ctx.routing.app_name, result);
    Ok(result)
}

/// Delete the App derived from `routing`
pub(crate) async fn delete_app<S: ObjectStore + ?Sized>(store: &S, routing: &AddonRouting) -> Result<()> {
    match delete_if_exists::<App, _>(store, &routing.app_name, &routing.app_namespace).await {
        Ok(true) => info!("Deleted app"),
        Ok(false) => info!("Addon app not found"),
        Err(e) => {
            error!("Error deleting addon app: {}", e);
            return Err(e);
        }
    }
    Ok(())
}

#[async_trait]
impl AddonStrategy for AppReconciler {
    #[instrument(skip(self, store, ctx), fields(app = %ctx.routing.app_name, namespace = %ctx.routing.app_namespace, remote = ctx.routing.remote))]
    async fn reconcile_normal<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
    ) -> Result<OperationResult> {
        let spec = self.desired_spec(ctx)?;
        apply_app(store, ctx, spec).await
    }

    #[instrument(skip(self, store, routing), fields(app = %routing.app_name, namespace = %routing.app_namespace))]
    async fn reconcile_delete<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        routing: &AddonRouting,
    ) -> Result<()> {
        delete_app(store, routing).await
    }

    async fn reconcile_data_values<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
    ) -> Result<OperationResult> {
        DataValuesReconciler::new(self.config.clone())
            .reconcile_normal(store, ctx, false)
            .await
    }
}
