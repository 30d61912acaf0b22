use bincode::{Decode, Encode};
use directories::ProjectDirs;
use log::{info, warn};
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config;

/// Fixed key for the all-charts best; per-chart entries use the chart's
/// short hash as their key.
pub const OVERALL_KEY: &str = "overall";

const SCORES_DIR_FALLBACK: &str = "save/scores";

/// One best-score record as stored on disk, one file per key.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct BestScore {
    pub score: u64,
    pub accuracy: f64,
    pub recorded_at_ms: i64,
}

// In-memory cache in front of the save files, so the menu path does not
// re-read disk every time.
static SCORE_CACHE: LazyLock<Mutex<FxHashMap<String, BestScore>>> =
    LazyLock::new(|| Mutex::new(FxHashMap::default()));

/// Returns the stored best for a key, if any. Disk problems degrade to
/// "no best score" rather than failing the caller.
pub fn best_for(key: &str) -> Option<BestScore> {
    if let Some(best) = SCORE_CACHE.lock().unwrap().get(key).copied() {
        return Some(best);
    }
    let from_disk = load_from_disk(key)?;
    SCORE_CACHE
        .lock()
        .unwrap()
        .insert(key.to_string(), from_disk);
    Some(from_disk)
}

/// Records a finished session against a key. Only a strictly higher score
/// replaces the stored best; returns whether this one did.
pub fn record(key: &str, score: u64, accuracy: f64) -> bool {
    if !is_improvement(best_for(key), score) {
        return false;
    }
    let entry = BestScore {
        score,
        accuracy,
        recorded_at_ms: unix_time_ms(),
    };
    if let Err(e) = persist(key, &entry) {
        // The record still counts for this process; only durability is lost.
        warn!("could not save best score for {key}: {e}");
    } else {
        info!("new best for {key}: {score} ({accuracy:.1}%)");
    }
    SCORE_CACHE.lock().unwrap().insert(key.to_string(), entry);
    true
}

fn is_improvement(previous: Option<BestScore>, score: u64) -> bool {
    previous.is_none_or(|best| score > best.score)
}

fn scores_dir() -> PathBuf {
    if let Some(root) = config::get().save_root {
        return root.join("scores");
    }
    ProjectDirs::from("", "", "tapsync")
        .map(|dirs| dirs.data_dir().join("scores"))
        .unwrap_or_else(|| PathBuf::from(SCORES_DIR_FALLBACK))
}

fn score_path(key: &str) -> PathBuf {
    scores_dir().join(format!("{key}.score"))
}

fn load_from_disk(key: &str) -> Option<BestScore> {
    let bytes = std::fs::read(score_path(key)).ok()?;
    match bincode::decode_from_slice(&bytes, bincode::config::standard()) {
        Ok((entry, _)) => Some(entry),
        Err(e) => {
            warn!("ignoring unreadable score file for {key}: {e}");
            None
        }
    }
}

fn persist(key: &str, entry: &BestScore) -> Result<(), Box<dyn std::error::Error>> {
    let dir = scores_dir();
    std::fs::create_dir_all(&dir)?;
    let bytes = bincode::encode_to_vec(entry, bincode::config::standard())?;
    std::fs::write(score_path(key), bytes)?;
    Ok(())
}

fn unix_time_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
