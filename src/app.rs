use crate::config::{self, DemoOptions};
use crate::game::chart::ChartData;
use crate::game::gameplay::{self, ClickEvent, Phase, SessionEvent};
use crate::game::parsing::beatmap;
use crate::game::stage_stats::SessionSummary;
use crate::game::{generator, scores};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use std::error::Error;

/// Host states as plain data. The presentation side only ever reads these;
/// all behavior lives in the session core.
pub enum Screen {
    Menu,
    Gameplay,
    Evaluation(SessionSummary),
}

/// Runs one headless session end to end: menu (best-score readout), a
/// fixed-step gameplay loop fed by a scripted autoplay plan, then the
/// evaluation payload on stdout.
pub fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = config::get();
    let mut rng = StdRng::seed_from_u64(cfg.demo.seed);

    present_screen(&Screen::Menu);

    let chart = select_chart(&args, &mut rng);
    info!(
        "chart: \"{}\" by {} ({} circles, {:.1} bpm, audio {})",
        chart.title,
        chart.artist,
        chart.targets.len(),
        chart.tempo_bpm,
        if chart.audio.is_some() { "embedded" } else { "none" },
    );

    let plan = autoplay_plan(&chart, &cfg.demo, &mut rng);
    let mut state = gameplay::init(chart);
    present_screen(&Screen::Gameplay);

    let mut next_click = 0usize;
    let mut last_logged_s = 0u64;
    while state.phase == Phase::Running {
        // Feed every click stamped inside the upcoming tick, in order.
        let tick_end = state.elapsed_ms + gameplay::TICK_MS;
        while next_click < plan.len() && plan[next_click].timestamp_ms <= tick_end {
            gameplay::queue_click(&mut state, plan[next_click]);
            next_click += 1;
        }

        gameplay::update(&mut state, gameplay::TICK_MS);
        for event in gameplay::take_events(&mut state) {
            present_event(&event);
        }

        let elapsed_s = (state.elapsed_ms / 1000.0) as u64;
        if elapsed_s > last_logged_s {
            last_logged_s = elapsed_s;
            let snapshot = gameplay::snapshot(&state);
            debug!(
                "t={}s score={} combo={} health={:.0}%",
                elapsed_s, snapshot.score, snapshot.combo, snapshot.health_percentage
            );
        }
    }

    let Some(summary) = gameplay::summary(&state) else {
        return Ok(());
    };
    present_screen(&Screen::Evaluation(summary.clone()));
    println!("{}", serde_json::to_string_pretty(&summary)?);

    scores::record(&state.chart.short_hash, summary.score, summary.accuracy);
    if scores::record(scores::OVERALL_KEY, summary.score, summary.accuracy) {
        info!("new overall best: {}", summary.score);
    }

    Ok(())
}

fn present_screen(screen: &Screen) {
    match screen {
        Screen::Menu => match scores::best_for(scores::OVERALL_KEY) {
            Some(best) => info!("best so far: {} ({:.1}%)", best.score, best.accuracy),
            None => info!("no best score recorded yet"),
        },
        Screen::Gameplay => info!("screen: gameplay"),
        Screen::Evaluation(summary) => info!(
            "screen: evaluation ({:?}, rank {:?})",
            summary.outcome, summary.rank
        ),
    }
}

fn present_event(event: &SessionEvent) {
    match event {
        SessionEvent::Spawned { target } => debug!("spawned {target:?}"),
        SessionEvent::Hit {
            target,
            judgment,
            gain,
            combo,
        } => debug!(
            "renderer: pop {target:?} ({:?}, {:+.1} ms) +{gain} combo {combo}",
            judgment.grade, judgment.time_error_ms
        ),
        SessionEvent::Miss { target } => debug!("renderer: fade {target:?}"),
    }
}

/// Imported chart when one is given and parses; otherwise a generated
/// fallback. A failed import never blocks play.
fn select_chart(args: &[String], rng: &mut StdRng) -> ChartData {
    if args.iter().any(|arg| arg == "--sample") {
        return generator::sample_chart(rng);
    }
    if let Some(path) = args.iter().find(|arg| !arg.starts_with("--")) {
        match std::fs::read(path) {
            Ok(bytes) => match beatmap::parse_archive(&bytes) {
                Ok(chart) => return chart,
                Err(e) => warn!("import of {path} failed ({e}); using a generated chart"),
            },
            Err(e) => warn!("could not read {path}: {e}; using a generated chart"),
        }
    }
    generator::random_chart(rng)
}

/// Scripted stand-in for pointer input: one click per target with a
/// uniform timing jitter, minus a configurable share of dropped targets.
fn autoplay_plan(chart: &ChartData, demo: &DemoOptions, rng: &mut StdRng) -> Vec<ClickEvent> {
    let mut plan = Vec::with_capacity(chart.targets.len());
    for target in &chart.targets {
        if demo.miss_chance > 0.0 && rng.random_bool(demo.miss_chance) {
            continue;
        }
        let jitter = if demo.jitter_ms > 0.0 {
            rng.random_range(-demo.jitter_ms..=demo.jitter_ms)
        } else {
            0.0
        };
        plan.push(ClickEvent {
            position: target.position,
            timestamp_ms: target.scheduled_time_ms + jitter,
        });
    }
    plan.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
    plan
}
