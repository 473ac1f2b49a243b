use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::error;
use serde::Deserialize;
use teloxide::prelude::*;
use tokio::sync::Mutex;

use crate::catalog::CatalogClient;
use crate::dialog::DialogEngine;
use crate::follow::FollowStore;

mod callback_handlers;
mod catalog;
mod choices;
mod dialog;
mod follow;
mod helpers;
mod message_handlers;
mod token;

#[cfg(test)]
mod tests;

#[derive(Debug, Deserialize, Clone)]
struct Config {
    token: String,
    ticketmaster_api_key: String,
    data_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    config: PathBuf,
}

struct AppState {
    catalog: CatalogClient,
    engine: Mutex<DialogEngine>,
    follows: Mutex<HashMap<i64, FollowStore>>,
    follows_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = load_config(&args.config)?;
    fs::create_dir_all(&config.data_dir).context("create data_dir")?;

    let follows_path = config.data_dir.join("follows.json");
    let follows = load_follows(&follows_path)?;

    let state = std::sync::Arc::new(AppState {
        catalog: CatalogClient::new(config.ticketmaster_api_key.clone()),
        engine: Mutex::new(DialogEngine::new()),
        follows: Mutex::new(follows),
        follows_path,
    });

    let bot = Bot::new(config.token);

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handlers::handle_message))
        .branch(Update::filter_callback_query().endpoint(callback_handlers::handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let config: Config = toml::from_str(&contents).context("parse config")?;
    Ok(config)
}

fn load_follows(path: &Path) -> Result<HashMap<i64, FollowStore>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let data =
        fs::read_to_string(path).with_context(|| format!("read follows {}", path.display()))?;
    let follows = serde_json::from_str(&data).context("parse follows")?;
    Ok(follows)
}

fn save_follows(path: &Path, follows: &HashMap<i64, FollowStore>) -> Result<()> {
    let data = serde_json::to_vec_pretty(follows).context("serialize follows")?;
    atomic_write(path, &data)
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(data).context("write temp file")?;
    tmp.flush().context("flush temp file")?;
    tmp.as_file_mut().sync_all().context("sync temp file")?;
    tmp.persist(path)
        .map_err(|e| anyhow!("persist temp file: {}", e))?;
    Ok(())
}
