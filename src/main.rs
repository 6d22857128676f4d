// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use addons_manager::config::Config;
use addons_manager::controllers::AddonController;
use addons_manager::kubernetes::wait_for_cluster_crd;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting addons manager");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: addon_namespace={}, app_sync_period={:?}",
        config.addon_namespace, config.app_sync_period
    );

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    // Addon requests reference Cluster API clusters, so wait for the CRD first
    info!("Waiting for Cluster API Cluster CRD to become available...");
    wait_for_cluster_crd(&client).await?;

    AddonController::new(client, config).run().await?;

    warn!("Addon controller stopped unexpectedly");
    Ok(())
}
