use std::sync::Arc;

use anyhow::{Context, Result};

use crate::catalog::{CatalogService, HttpCatalogService};
use crate::config;
use crate::manifest;
use crate::ui;

pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;

    let client = manifest::Client::new(manifest::ClientConfig {
        user_agent: cfg.catalog.user_agent.clone(),
        ..manifest::ClientConfig::default()
    })
    .context("build manifest client")?;
    let service: Arc<dyn CatalogService> = Arc::new(HttpCatalogService::new(Arc::new(client)));

    let options = ui::Options {
        status_message: "Use arrows to browse, Enter to play, q to quit.".to_string(),
        catalog_service: service,
        player: cfg.player.clone(),
        carousel_interval: cfg.ui.carousel_interval,
        theme: cfg.ui.theme.clone(),
    };

    let mut model = ui::Model::new(options);
    model.run()
}
