// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Package strategy: PackageInstall for local addons, imgpkg-bundle App for remote ones.

use super::app::{apply_app, base_app_spec, delete_app};
use super::{object_meta, set_annotations, AddonContext, AddonStrategy, DataValuesReconciler};
use crate::config::Config;
use crate::constants::templating;
use crate::error::Result;
use crate::images::{resolve_core_package_repository_image, resolve_template_image};
use crate::routing::AddonRouting;
use crate::store::{create_or_update, delete_if_exists, log_operation_result, ObjectStore, OperationResult};
use crate::types::app::{
    AppFetch, AppTemplate, FetchImgpkgBundle, InlineSource, TemplateKbld, TemplateYtt,
};
use crate::types::package::{
    PackageInstallValues, PackageRef, PackageRepositoryFetch, ValuesSecretRef,
    VersionSelectionSemver,
};
use crate::types::{AppSpec, PackageInstall, PackageInstallSpec, PackageRepository, PackageRepositorySpec};
use async_trait::async_trait;
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct PackageReconciler {
    config: Config,
}

impl PackageReconciler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Remote clusters cannot install packages yet, so the bundle is deployed by a raw App
    pub fn desired_remote_app_spec(&self, ctx: &AddonContext<'_>) -> Result<AppSpec> {
        let template_image_url = resolve_template_image(ctx.addon, ctx.image_repository, ctx.bom)
            .inspect_err(|e| error!("Error getting addon template image: {}", e))?;
        info!(image_url = %template_image_url, "Addon template image found");

        let mut spec = base_app_spec(&self.config, ctx);
        spec.fetch = vec![AppFetch {
            imgpkg_bundle: Some(FetchImgpkgBundle {
                image: template_image_url,
            }),
            ..Default::default()
        }];
        spec.template = vec![
            AppTemplate {
                ytt: Some(TemplateYtt {
                    ignore_unknown_comments: true,
                    strict: false,
                    paths: vec![templating::BUNDLE_CONFIG_PATH.to_string()],
                    inline: Some(InlineSource::from_secret(&ctx.routing.secret_name)),
                }),
                kbld: None,
            },
            AppTemplate {
                ytt: None,
                kbld: Some(TemplateKbld {
                    paths: templating::KBLD_PATHS.iter().map(|p| p.to_string()).collect(),
                }),
            },
        ];
        spec.noop_delete = true;
        Ok(spec)
    }

    pub fn desired_package_install_spec(&self, ctx: &AddonContext<'_>) -> PackageInstallSpec {
        PackageInstallSpec {
            service_account_name: Some(self.config.service_account.clone()),
            package_ref: Some(PackageRef {
                ref_name: ctx.addon.package_name.clone(),
                version_selection: Some(VersionSelectionSemver::any_including_prereleases()),
            }),
            values: vec![PackageInstallValues {
                secret_ref: Some(ValuesSecretRef {
                    name: ctx.routing.secret_name.clone(),
                }),
            }],
            paused: false,
        }
    }

    /// Ensure the core package repository serving the addon's package exists
    #[instrument(skip(self, store, ctx), fields(repository = %self.config.core_package_repository_name))]
    pub async fn reconcile_core_package_repository<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
    ) -> Result<OperationResult> {
        let image = resolve_core_package_repository_image(ctx.image_repository, ctx.bom)
            .inspect_err(|e| error!("Core package repository image not found: {}", e))?;

        let repository = PackageRepository {
            metadata: object_meta(
                &self.config.core_package_repository_name,
                &self.config.addon_namespace,
            ),
            spec: PackageRepositorySpec::default(),
        };

        let result = create_or_update(store, repository, |repo: &mut PackageRepository| {
            repo.spec = PackageRepositorySpec {
                fetch: Some(PackageRepositoryFetch {
                    imgpkg_bundle: Some(FetchImgpkgBundle {
                        image: image.clone(),
                    }),
                }),
            };
        })
        .await
        .inspect_err(|e| error!("Error creating or updating core package repository: {}", e))?;

        log_operation_result(
            "core package repository",
            &self.config.core_package_repository_name,
            result,
        );
        Ok(result)
    }

    async fn reconcile_package_install<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
    ) -> Result<OperationResult> {
        self.reconcile_core_package_repository(store, ctx).await?;

        let annotations = ctx.annotations();
        let spec = self.desired_package_install_spec(ctx);
        let package_install = PackageInstall {
            metadata: object_meta(&ctx.routing.app_name, &ctx.routing.app_namespace),
            spec: PackageInstallSpec::default(),
        };

        let result = create_or_update(store, package_install, |pkgi: &mut PackageInstall| {
            set_annotations(&mut pkgi.metadata, &annotations);
            // Pausing is left to the user
            let paused = pkgi.spec.paused;
            pkgi.spec = PackageInstallSpec {
                paused,
                ..spec.clone()
            };
        })
        .await
        .inspect_err(|e| error!("Error creating or updating addon PackageInstall: {}", e))?;

        log_operation_result("PackageInstall", &ctx.routing.app_name, result);
        Ok(result)
    }
}

#[async_trait]
impl AddonStrategy for PackageReconciler {
    #[instrument(skip(self, store, ctx), fields(name = %ctx.routing.app_name, namespace = %ctx.routing.app_namespace, remote = ctx.routing.remote))]
    async fn reconcile_normal<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
    ) -> Result<OperationResult> {
        if ctx.routing.remote {
            let spec = self.desired_remote_app_spec(ctx)?;
            apply_app(store, ctx, spec).await
        } else {
            self.reconcile_package_install(store, ctx).await
        }
    }

    #[instrument(skip(self, store, routing), fields(name = %routing.app_name, namespace = %routing.app_namespace, remote = routing.remote))]
    async fn reconcile_delete<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        routing: &AddonRouting,
    ) -> Result<()> {
        if routing.remote {
            return delete_app(store, routing).await;
        }

        match delete_if_exists::<PackageInstall, _>(store, &routing.app_name, &routing.app_namespace)
            .await
        {
            Ok(true) => info!("Deleted PackageInstall"),
            Ok(false) => info!("Addon PackageInstall not found"),
            Err(e) => {
                error!("Error deleting addon PackageInstall: {}", e);
                return Err(e);
            }
        }
        Ok(())
    }

    async fn reconcile_data_values<S: ObjectStore + ?Sized>(
        &self,
        store: &S,
        ctx: &AddonContext<'_>,
    ) -> Result<OperationResult> {
        DataValuesReconciler::new(self.config.clone())
            .reconcile_normal(store, ctx, true)
            .await
    }
}
