use anyhow::Context;
use revisions_common::{snapshots, SiteId, UserId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::duplication::Duplication;
use crate::infrastructure::settings::Settings;

pub mod domain;
pub mod infrastructure;

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let containers = snapshots::load(&settings.source_path)?;
    tracing::info!("Loaded {} containers from {}", containers.len(), settings.source_path);

    let created_by_user_id = UserId::try_new(settings.created_by_user_id.as_str())
        .context("invalid created_by_user_id setting")?;
    let duplication = Duplication::new(
        settings.mode,
        SiteId(settings.target_site_id),
        created_by_user_id,
        settings.created_reason.as_str(),
    );

    // copy site containers for the target site
    let copies = duplication.run(&containers)?;

    snapshots::save(&settings.target_path, &copies)?;
    tracing::info!("Saved {} copies to {}", copies.len(), settings.target_path);

    Ok(())
}
