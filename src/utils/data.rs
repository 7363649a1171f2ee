use crate::models::Pick;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, SystemTime};

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Save any serializable dataset to a JSON cache file
pub fn save_to_cache<T: Serialize + ?Sized>(data: &T, cache_file: &Path) -> Result<()> {
    ensure_parent_dir(cache_file)?;
    let json = serde_json::to_string_pretty(data).context("Failed to serialize cache data")?;
    std::fs::write(cache_file, json).context("Failed to write cache file")?;
    Ok(())
}

/// Load a dataset previously written by `save_to_cache`
pub fn load_from_cache<T: DeserializeOwned>(cache_file: &Path) -> Result<T> {
    let json = std::fs::read_to_string(cache_file).context("Failed to read cache file")?;
    let data = serde_json::from_str(&json).context("Failed to deserialize cache data")?;
    Ok(data)
}

/// True when the file exists and was modified less than `ttl` ago
pub fn cache_is_fresh(cache_file: &Path, ttl: Duration) -> bool {
    std::fs::metadata(cache_file)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age < ttl)
}

#[derive(Debug, Serialize)]
struct PickRow<'a> {
    pick_id: i64,
    round_no: u32,
    overall_no: u32,
    team_slot_id: u32,
    player_id: &'a str,
    ts: String,
}

/// Write picks to CSV in the order given. The header is written even when
/// there are no picks.
pub fn save_picks_to_csv(picks: &[Pick], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;

    writer.write_record([
        "pick_id",
        "round_no",
        "overall_no",
        "team_slot_id",
        "player_id",
        "ts",
    ])?;
    for pick in picks {
        writer.serialize(PickRow {
            pick_id: pick.pick_id,
            round_no: pick.round_no,
            overall_no: pick.overall_no,
            team_slot_id: pick.team_slot_id,
            player_id: &pick.player_id,
            ts: pick.ts.to_rfc3339(),
        })?;
    }
    writer.flush().context("Failed to flush CSV file")?;

    Ok(())
}
