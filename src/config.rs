use log::warn;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex};

const CONFIG_PATH: &str = "tapsync.ini";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

/// Settings for the scripted autoplay the demo host feeds the session.
#[derive(Debug, Clone, Copy)]
pub struct DemoOptions {
    pub seed: u64,
    /// Uniform timing error, in ms, applied to each scripted click.
    pub jitter_ms: f64,
    /// Chance in [0, 1] that a target gets no click at all.
    pub miss_chance: f64,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            jitter_ms: 40.0,
            miss_chance: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: LogLevel,
    /// Overrides the platform data dir for save files when set.
    pub save_root: Option<PathBuf>,
    pub demo: DemoOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            save_root: None,
            demo: DemoOptions::default(),
        }
    }
}

// Loaded once at startup and read-only afterwards.
static CONFIG: LazyLock<Mutex<Config>> = LazyLock::new(|| Mutex::new(Config::default()));

pub fn load() {
    let Ok(content) = std::fs::read_to_string(CONFIG_PATH) else {
        // Missing config is the common case; defaults apply.
        return;
    };
    let parsed = parse(&content);
    *CONFIG.lock().unwrap() = parsed;
}

pub fn get() -> Config {
    CONFIG.lock().unwrap().clone()
}

/// Parses the INI text into a config, warning about (and skipping) values
/// that do not parse rather than failing the whole load.
fn parse(content: &str) -> Config {
    let values = read_ini(content);
    let mut config = Config::default();

    if let Some(raw) = values.get("options.loglevel") {
        match raw.parse() {
            Ok(level) => config.log_level = level,
            Err(()) => warn!("unknown LogLevel \"{raw}\" in {CONFIG_PATH}"),
        }
    }
    if let Some(raw) = values.get("options.saveroot")
        && !raw.is_empty()
    {
        config.save_root = Some(PathBuf::from(raw));
    }
    if let Some(raw) = values.get("demo.seed") {
        match raw.parse() {
            Ok(seed) => config.demo.seed = seed,
            Err(_) => warn!("invalid Seed \"{raw}\" in {CONFIG_PATH}"),
        }
    }
    if let Some(raw) = values.get("demo.jitterms") {
        match raw.parse::<f64>() {
            Ok(jitter) if jitter >= 0.0 => config.demo.jitter_ms = jitter,
            _ => warn!("invalid JitterMs \"{raw}\" in {CONFIG_PATH}"),
        }
    }
    if let Some(raw) = values.get("demo.misschance") {
        match raw.parse::<f64>() {
            Ok(chance) => config.demo.miss_chance = chance.clamp(0.0, 1.0),
            Err(_) => warn!("invalid MissChance \"{raw}\" in {CONFIG_PATH}"),
        }
    }

    config
}

/// Minimal section-aware INI reader: keys come back as lowercased
/// "section.key" entries; comments and blank lines are skipped.
fn read_ini(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    let mut section = String::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
            section = line[1..line.len() - 1].trim().to_ascii_lowercase();
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().to_ascii_lowercase();
            if key.is_empty() {
                continue;
            }
            values.insert(format!("{section}.{key}"), value.trim().to_string());
        }
    }

    values
}
