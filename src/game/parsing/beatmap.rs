use crate::game::chart::{
    self, AudioAsset, ChartData, PLAYFIELD_MAX_X, PLAYFIELD_MAX_Y, PLAYFIELD_MIN_X,
    PLAYFIELD_MIN_Y, Target, TargetId,
};
use bitflags::bitflags;
use glam::Vec2;
use log::{debug, warn};
use std::error::Error;
use std::fmt;
use std::io::{Cursor, Read};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Tempo used when a chart carries no usable timing point.
pub const DEFAULT_BPM: f64 = 120.0;

const UNKNOWN_FIELD: &str = "Unknown";
const CHART_EXT: &str = ".osu";
const AUDIO_EXTS: [&str; 3] = [".mp3", ".ogg", ".wav"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The byte stream is not a readable zip archive.
    InvalidContainer,
    /// The archive holds no chart-description entry.
    NoChartFile,
    /// The chart entry blew up mid-parse; nothing partial is ever returned.
    Malformed,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidContainer => write!(f, "not a readable beatmap archive"),
            ParseError::NoChartFile => write!(f, "no chart file in archive"),
            ParseError::Malformed => write!(f, "malformed chart file"),
        }
    }
}

impl Error for ParseError {}

bitflags! {
    /// Object type mask from field 3 of a hit-object line. Only plain
    /// circles are imported; the other kinds are dropped on purpose.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HitObjectKind: u32 {
        const CIRCLE = 1;
        const SLIDER = 1 << 1;
        const NEW_COMBO = 1 << 2;
        const SPINNER = 1 << 3;
        const HOLD = 1 << 7;
    }
}

/// Decodes a beatmap archive into a playable chart.
///
/// The first `.osu` entry in archive order is authoritative; later ones are
/// ignored. The first audio-extension entry is extracted as an opaque blob,
/// and its absence is not an error.
pub fn parse_archive(bytes: &[u8]) -> Result<ChartData, ParseError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        warn!("unreadable beatmap archive: {e}");
        ParseError::InvalidContainer
    })?;

    let mut chart_text: Option<String> = None;
    let mut audio: Option<AudioAsset> = None;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|_| ParseError::InvalidContainer)?;
        let name = entry.name().to_string();

        if chart_text.is_none() && name.ends_with(CHART_EXT) {
            let mut text = String::new();
            entry
                .read_to_string(&mut text)
                .map_err(|_| ParseError::Malformed)?;
            chart_text = Some(text);
        } else if audio.is_none() && AUDIO_EXTS.iter().any(|ext| name.ends_with(ext)) {
            let mut payload = Vec::new();
            if entry.read_to_end(&mut payload).is_ok() {
                audio = Some(AudioAsset {
                    name,
                    bytes: payload,
                });
            }
            // An unreadable audio entry just means no playback; keep going.
        }
    }

    let Some(text) = chart_text else {
        return Err(ParseError::NoChartFile);
    };

    // The text stage must never hand back partial data: any panic in it
    // surfaces as a plain Malformed to the caller.
    let mut parsed = catch_unwind(AssertUnwindSafe(|| parse_chart_text(&text))).map_err(|_| {
        warn!("chart text parsing panicked; treating archive as malformed");
        ParseError::Malformed
    })?;
    parsed.audio = audio;
    debug!(
        "parsed chart \"{}\" by {}: {} circles at {:.1} bpm",
        parsed.title,
        parsed.artist,
        parsed.targets.len(),
        parsed.tempo_bpm
    );
    Ok(parsed)
}

/// Parses the section-based chart text. Unparseable lines are skipped, not
/// fatal, matching how the upstream chart format is consumed in practice.
fn parse_chart_text(text: &str) -> ChartData {
    let mut title = UNKNOWN_FIELD.to_string();
    let mut artist = UNKNOWN_FIELD.to_string();
    let mut tempo_bpm: Option<f64> = None;
    let mut targets: Vec<Target> = Vec::new();
    let mut section = "";

    for raw_line in text.lines() {
        let line = raw_line.trim();

        if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
            section = &line[1..line.len() - 1];
            continue;
        }

        match section {
            "Metadata" => {
                if let Some((key, value)) = line.split_once(':') {
                    match key.trim() {
                        "Title" => title = value.trim().to_string(),
                        "Artist" => artist = value.trim().to_string(),
                        _ => {}
                    }
                }
            }
            "TimingPoints" => {
                // Only the first point with a positive beat length defines
                // the chart tempo; inherited (negative) points are skipped.
                if tempo_bpm.is_none()
                    && let Some(beat_length) = line
                        .split(',')
                        .nth(1)
                        .and_then(|field| field.trim().parse::<f64>().ok())
                    && beat_length > 0.0
                {
                    tempo_bpm = Some(60_000.0 / beat_length);
                }
            }
            "HitObjects" => {
                if line.contains(',')
                    && let Some(target) = parse_hit_object(line, targets.len() as u32)
                {
                    targets.push(target);
                }
            }
            _ => {}
        }
    }

    targets.sort_by(|a, b| a.scheduled_time_ms.total_cmp(&b.scheduled_time_ms));

    ChartData {
        title,
        artist,
        audio: None,
        tempo_bpm: tempo_bpm.unwrap_or(DEFAULT_BPM),
        targets,
        short_hash: chart::content_hash(text.as_bytes()),
    }
}

fn parse_hit_object(line: &str, next_id: u32) -> Option<Target> {
    let mut fields = line.split(',');
    let x: f32 = fields.next()?.trim().parse().ok()?;
    let y: f32 = fields.next()?.trim().parse().ok()?;
    let time: f64 = fields.next()?.trim().parse().ok()?;
    let kind = HitObjectKind::from_bits_retain(fields.next()?.trim().parse().ok()?);

    if !kind.contains(HitObjectKind::CIRCLE) {
        // Sliders, spinners and holds are out of scope for this engine.
        return None;
    }

    let position = Vec2::new(
        x.clamp(PLAYFIELD_MIN_X, PLAYFIELD_MAX_X),
        y.clamp(PLAYFIELD_MIN_Y, PLAYFIELD_MAX_Y),
    );
    Some(Target::new(TargetId(next_id), position, time))
}
