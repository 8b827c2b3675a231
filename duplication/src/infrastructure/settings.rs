use std::env;

use anyhow::Context;
use config::{Config, Environment, File};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::domain::duplication::DuplicationMode;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// directory with the container snapshots to copy
    pub source_path: String,
    /// directory receiving the copies
    pub target_path: String,
    pub target_site_id: i64,
    pub mode: DuplicationMode,
    pub created_by_user_id: String,
    #[serde(default = "default_reason")]
    pub created_reason: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        let run_mode = load_env("RUN_MODE", "development");

        let s = Config::builder()
            .add_source(File::with_name("./config/default"))
            .add_source(File::with_name(&format!("./config/{run_mode}")).required(false))
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize().with_context(|| "failed to read config")
    }
}

fn default_reason() -> String {
    "Site copy".to_string()
}

fn load_env(key: &str, default_value: &'static str) -> String {
    env::var(key).unwrap_or_else(|_| default_value.into())
}
