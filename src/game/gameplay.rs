use crate::game::chart::{ChartData, TargetId, TargetState};
use crate::game::judgment::{Judgment, classify_offset_ms, grade_points_for};
use crate::game::life::{HEALTH_MAX, LIFE_HIT, LIFE_MISS};
use crate::game::scoring::score_gain;
use crate::game::stage_stats::{Outcome, SessionSummary};
use crate::game::timing_windows::{
    EXPIRE_GRACE_MS, HIT_WINDOW_MS, MISS_WINDOW_MS, SPAWN_WINDOW_MS,
};
use glam::Vec2;
use log::{debug, info};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Nominal fixed step the host drives the session at.
pub const TICK_MS: f64 = 16.0;

/// Pointer click in playfield space, stamped by the host clock. Judgement
/// uses the stamp, not the draining tick's clock, so a replayed queue
/// reproduces the session exactly.
#[derive(Copy, Clone, Debug)]
pub struct ClickEvent {
    pub position: Vec2,
    pub timestamp_ms: f64,
}

/// Signals for the presentation layer, drained once per tick via
/// [`take_events`].
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// A target entered its spawn window and is now clickable.
    Spawned { target: TargetId },
    Hit {
        target: TargetId,
        judgment: Judgment,
        gain: u64,
        combo: u32,
    },
    Miss { target: TargetId },
}

/// Per-tick UI-facing values.
#[derive(Copy, Clone, Debug, Serialize)]
pub struct Snapshot {
    pub score: u64,
    pub combo: u32,
    pub health_percentage: f32,
    pub combo_visible: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Running,
    Ended(Outcome),
}

type EventBuf = SmallVec<[SessionEvent; 8]>;

/// One play-through of one chart. The state machine exclusively owns the
/// chart (and the per-target runtime states embedded in it) for its whole
/// lifetime; restarting means building a fresh `State`.
pub struct State {
    pub chart: ChartData,
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub health: f32,
    pub elapsed_ms: f64,
    pub phase: Phase,
    pub hit_count: u32,
    pub miss_count: u32,
    /// Indices into `chart.targets` in activation order; this is the scan
    /// order the judgement tie-break is defined over.
    active: Vec<usize>,
    pending_clicks: VecDeque<ClickEvent>,
    events: EventBuf,
}

pub fn init(chart: ChartData) -> State {
    info!(
        "session start: \"{}\" by {} ({} circles, {:.1} bpm)",
        chart.title,
        chart.artist,
        chart.targets.len(),
        chart.tempo_bpm
    );
    State {
        chart,
        score: 0,
        combo: 0,
        max_combo: 0,
        health: HEALTH_MAX,
        elapsed_ms: 0.0,
        phase: Phase::Running,
        hit_count: 0,
        miss_count: 0,
        active: Vec::new(),
        pending_clicks: VecDeque::new(),
        events: EventBuf::new(),
    }
}

/// Enqueues a pointer click for the next tick. Clicks arriving after the
/// session ended are discarded; nothing is judged past that point.
pub fn queue_click(state: &mut State, click: ClickEvent) {
    if state.phase != Phase::Running {
        return;
    }
    state.pending_clicks.push_back(click);
}

/// Advances the session by one tick: drain queued clicks through the
/// judgement engine, activate due targets, retire overdue ones, run the
/// full-list miss sweep, then settle the terminal state.
pub fn update(state: &mut State, dt_ms: f64) {
    if state.phase != Phase::Running {
        return;
    }
    state.elapsed_ms += dt_ms;

    while let Some(click) = state.pending_clicks.pop_front() {
        judge_a_click(state, click);
    }

    activate_due_targets(state);
    expire_overdue_actives(state);
    sweep_missed_targets(state);

    state
        .active
        .retain(|&index| !state.chart.targets[index].is_resolved());

    check_terminal(state);
}

pub fn snapshot(state: &State) -> Snapshot {
    Snapshot {
        score: state.score,
        combo: state.combo,
        health_percentage: state.health / HEALTH_MAX * 100.0,
        combo_visible: state.combo > 1,
    }
}

/// Hands the tick's accumulated signals to the presentation layer.
pub fn take_events(state: &mut State) -> EventBuf {
    std::mem::take(&mut state.events)
}

/// Final statistics, available once the session has ended.
pub fn summary(state: &State) -> Option<SessionSummary> {
    let Phase::Ended(outcome) = state.phase else {
        return None;
    };
    Some(SessionSummary::new(
        outcome,
        state.score,
        state.combo,
        state.max_combo,
        state.hit_count,
        state.chart.total_targets(),
    ))
}

/// Resolves one click against the active targets. The first target that
/// passes both the spatial and the temporal test wins and scanning stops;
/// at most one target resolves per click. A click that lands on nothing is
/// a pure no-op — empty-space clicks never cost anything.
fn judge_a_click(state: &mut State, click: ClickEvent) {
    let mut chosen: Option<usize> = None;
    for &index in &state.active {
        let target = &state.chart.targets[index];
        if target.state() != TargetState::Active {
            continue;
        }
        if !target.contains(click.position) {
            continue;
        }
        if (click.timestamp_ms - target.scheduled_time_ms).abs() <= HIT_WINDOW_MS {
            chosen = Some(index);
            break;
        }
        // Spatial match with a dead timing window: keep scanning, a
        // stacked circle behind this one may still be live.
    }

    let Some(index) = chosen else {
        debug!(
            "click at ({:.0},{:.0}) t={:.0} hit nothing",
            click.position.x, click.position.y, click.timestamp_ms
        );
        return;
    };

    let target = &mut state.chart.targets[index];
    if !target.mark_hit() {
        return;
    }
    let id = target.id;
    let time_error_ms = click.timestamp_ms - target.scheduled_time_ms;

    let grade = classify_offset_ms(time_error_ms.abs());
    let gain = score_gain(grade_points_for(grade), state.combo);
    state.score += gain;
    state.combo += 1;
    state.max_combo = state.max_combo.max(state.combo);
    state.hit_count += 1;
    apply_life_change(state, LIFE_HIT);

    info!(
        "hit: grade={:?} error_ms={:+.1} gain={} combo={}",
        grade, time_error_ms, gain, state.combo
    );
    state.events.push(SessionEvent::Hit {
        target: id,
        judgment: Judgment {
            time_error_ms,
            grade,
        },
        gain,
        combo: state.combo,
    });
}

/// Pending → Active for every target inside the spawn window that is not
/// yet due. Past-due pending targets stay pending for the sweep to catch.
fn activate_due_targets(state: &mut State) {
    let now = state.elapsed_ms;
    for (index, target) in state.chart.targets.iter_mut().enumerate() {
        if target.state() != TargetState::Pending {
            continue;
        }
        let time_until = target.scheduled_time_ms - now;
        if time_until <= SPAWN_WINDOW_MS && time_until > 0.0 && target.activate() {
            state.active.push(index);
            state.events.push(SessionEvent::Spawned { target: target.id });
        }
    }
}

/// Tick-driven expiry: an active target more than the grace past its beat
/// is retired as a miss.
fn expire_overdue_actives(state: &mut State) {
    let now = state.elapsed_ms;
    for slot in 0..state.active.len() {
        let index = state.active[slot];
        let target = &mut state.chart.targets[index];
        if target.state() != TargetState::Active {
            continue;
        }
        if now - target.scheduled_time_ms > EXPIRE_GRACE_MS && target.mark_missed() {
            let id = target.id;
            apply_miss(state, id);
        }
    }
}

/// The full-list sweep: walks every unresolved target, not just the active
/// ones, so a target that never activated still resolves. This and the
/// expiry pass race benignly — `mark_missed` is a no-op the second time.
fn sweep_missed_targets(state: &mut State) {
    let now = state.elapsed_ms;
    for index in 0..state.chart.targets.len() {
        let target = &mut state.chart.targets[index];
        if target.is_resolved() {
            continue;
        }
        if now - target.scheduled_time_ms > MISS_WINDOW_MS && target.mark_missed() {
            let id = target.id;
            apply_miss(state, id);
        }
    }
}

fn apply_miss(state: &mut State, id: TargetId) {
    state.combo = 0;
    state.miss_count += 1;
    apply_life_change(state, LIFE_MISS);
    info!("miss: target={:?} health={:.0}", id, state.health);
    state.events.push(SessionEvent::Miss { target: id });
}

fn apply_life_change(state: &mut State, delta: f32) {
    state.health = (state.health + delta).clamp(0.0, HEALTH_MAX);
}

/// Defeat is checked before victory: a cleared chart with drained health
/// still fails.
fn check_terminal(state: &mut State) {
    if state.health <= 0.0 {
        end_session(state, Outcome::Defeat);
        return;
    }
    if state.chart.targets.iter().all(|t| t.is_resolved()) {
        end_session(state, Outcome::Victory);
    }
}

fn end_session(state: &mut State, outcome: Outcome) {
    state.phase = Phase::Ended(outcome);
    state.pending_clicks.clear();
    info!(
        "session over: {:?} score={} hits={}/{} combo_at_end={} max_combo={}",
        outcome,
        state.score,
        state.hit_count,
        state.chart.total_targets(),
        state.combo,
        state.max_combo
    );
}

#[cfg(test)]
mod tests {
    use super::{
        ClickEvent, Phase, SessionEvent, State, TICK_MS, init, queue_click, snapshot, summary,
        take_events, update,
    };
    use crate::game::chart::{self, ChartData, Target, TargetId, TargetState};
    use crate::game::judgment::JudgeGrade;
    use crate::game::stage_stats::Outcome;
    use glam::Vec2;

    fn chart_with(targets: &[(f32, f32, f64)]) -> ChartData {
        let targets = targets
            .iter()
            .enumerate()
            .map(|(i, &(x, y, time))| Target::new(TargetId(i as u32), Vec2::new(x, y), time))
            .collect();
        ChartData {
            title: "fixture".to_string(),
            artist: "tests".to_string(),
            audio: None,
            tempo_bpm: 120.0,
            targets,
            short_hash: chart::content_hash(b"fixture"),
        }
    }

    fn tick_until(state: &mut State, elapsed_ms: f64) {
        while state.elapsed_ms < elapsed_ms && state.phase == Phase::Running {
            update(state, TICK_MS);
        }
    }

    fn click(state: &mut State, x: f32, y: f32, timestamp_ms: f64) {
        queue_click(
            state,
            ClickEvent {
                position: Vec2::new(x, y),
                timestamp_ms,
            },
        );
        update(state, TICK_MS);
    }

    #[test]
    fn exact_click_is_a_perfect_300() {
        let mut state = init(chart_with(&[(500.0, 500.0, 2000.0)]));
        tick_until(&mut state, 1984.0);
        assert_eq!(state.chart.targets[0].state(), TargetState::Active);
        take_events(&mut state);

        click(&mut state, 500.0, 500.0, 2000.0);

        assert_eq!(state.score, 300);
        assert_eq!(state.combo, 1);
        assert_eq!(state.health, 100.0); // capped
        assert_eq!(state.hit_count, 1);
        assert_eq!(state.chart.targets[0].state(), TargetState::Hit);

        let events = take_events(&mut state);
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::Hit { gain: 300, combo: 1, judgment, .. }]
                if judgment.grade == JudgeGrade::Perfect && judgment.time_error_ms == 0.0
        ));

        // The lone target resolved with health intact: victory.
        assert_eq!(state.phase, Phase::Ended(Outcome::Victory));
        let summary = summary(&state).unwrap();
        assert_eq!(summary.accuracy, 100.0);
        assert_eq!(summary.hit_circles, 1);
    }

    #[test]
    fn unclicked_target_is_swept_after_the_miss_window() {
        let mut state = init(chart_with(&[(500.0, 500.0, 2000.0)]));
        tick_until(&mut state, 2192.0);
        // 192 ms past due: not yet past the 200 ms window.
        assert_eq!(state.chart.targets[0].state(), TargetState::Active);

        update(&mut state, TICK_MS); // 2208: sweep fires
        assert_eq!(state.chart.targets[0].state(), TargetState::Missed);
        assert_eq!(state.combo, 0);
        assert_eq!(state.health, 90.0);
        assert_eq!(state.miss_count, 1);
    }

    #[test]
    fn a_missed_only_chart_still_ends_in_victory() {
        let mut state = init(chart_with(&[(500.0, 500.0, 2000.0)]));
        tick_until(&mut state, 3000.0);

        assert_eq!(state.phase, Phase::Ended(Outcome::Victory));
        let summary = summary(&state).unwrap();
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.hit_circles, 0);
        assert_eq!(summary.total_circles, 1);
    }

    #[test]
    fn defeat_wins_over_a_simultaneous_victory() {
        // Ten stacked targets resolve in the same sweep tick, draining
        // health to exactly zero while also completing the chart.
        let targets: Vec<(f32, f32, f64)> = (0..10).map(|_| (500.0, 500.0, 1000.0)).collect();
        let mut state = init(chart_with(&targets));
        tick_until(&mut state, 4000.0);

        assert_eq!(state.health, 0.0);
        assert!(state.chart.targets.iter().all(|t| t.is_resolved()));
        assert_eq!(state.phase, Phase::Ended(Outcome::Defeat));
    }

    #[test]
    fn empty_space_clicks_change_nothing() {
        let mut state = init(chart_with(&[(500.0, 500.0, 2000.0)]));
        tick_until(&mut state, 1984.0);
        take_events(&mut state);

        // Outside the radius (distance ~141 > 60), inside the window.
        click(&mut state, 600.0, 600.0, 2000.0);

        assert_eq!(state.score, 0);
        assert_eq!(state.combo, 0);
        assert_eq!(state.health, 100.0);
        assert_eq!(state.chart.targets[0].state(), TargetState::Active);
        assert!(take_events(&mut state).is_empty());
    }

    #[test]
    fn spatial_match_outside_the_hit_window_is_a_noop() {
        let mut state = init(chart_with(&[(500.0, 500.0, 2000.0)]));
        tick_until(&mut state, 1600.0);

        // Dead center, but 200 ms early: 200 > 150.
        click(&mut state, 500.0, 500.0, 1800.0);

        assert_eq!(state.score, 0);
        assert_eq!(state.chart.targets[0].state(), TargetState::Active);
    }

    #[test]
    fn first_hittable_candidate_wins_and_only_one_resolves() {
        // Two overlapping circles, both inside the window of one click.
        let mut state = init(chart_with(&[(500.0, 500.0, 2000.0), (500.0, 500.0, 2010.0)]));
        tick_until(&mut state, 1984.0);

        click(&mut state, 500.0, 500.0, 2005.0);

        assert_eq!(state.chart.targets[0].state(), TargetState::Hit);
        assert_eq!(state.chart.targets[1].state(), TargetState::Active);
        assert_eq!(state.hit_count, 1);
    }

    #[test]
    fn combo_multiplier_applies_to_the_second_hit() {
        let mut state = init(chart_with(&[(300.0, 300.0, 2000.0), (700.0, 400.0, 2400.0)]));
        tick_until(&mut state, 1984.0);
        click(&mut state, 300.0, 300.0, 2000.0);
        tick_until(&mut state, 2384.0);
        click(&mut state, 700.0, 400.0, 2400.0);

        // 300 + floor(300 * 1.1)
        assert_eq!(state.score, 630);
        assert_eq!(state.combo, 2);
        assert_eq!(state.max_combo, 2);
    }

    #[test]
    fn activation_waits_for_the_spawn_window() {
        let mut state = init(chart_with(&[(500.0, 500.0, 5000.0)]));
        tick_until(&mut state, 2992.0);
        assert_eq!(state.chart.targets[0].state(), TargetState::Pending);
        take_events(&mut state);

        update(&mut state, TICK_MS); // 3008: inside the 2000 ms window
        assert_eq!(state.chart.targets[0].state(), TargetState::Active);
        let events = take_events(&mut state);
        assert!(matches!(events.as_slice(), [SessionEvent::Spawned { .. }]));
    }

    #[test]
    fn resolved_targets_never_change_again() {
        let mut state = init(chart_with(&[(500.0, 500.0, 2000.0), (500.0, 500.0, 9000.0)]));
        tick_until(&mut state, 1984.0);
        click(&mut state, 500.0, 500.0, 2000.0);
        assert_eq!(state.chart.targets[0].state(), TargetState::Hit);
        take_events(&mut state);

        // Run far past every window; the hit target must not be re-missed.
        tick_until(&mut state, 8000.0);
        assert_eq!(state.chart.targets[0].state(), TargetState::Hit);
        assert_eq!(state.miss_count, 0);
        assert_eq!(state.health, 100.0);
        assert!(
            take_events(&mut state)
                .iter()
                .all(|e| !matches!(e, SessionEvent::Miss { target } if *target == TargetId(0)))
        );
    }

    #[test]
    fn nothing_is_judged_after_the_session_ends() {
        let mut state = init(chart_with(&[(500.0, 500.0, 2000.0)]));
        tick_until(&mut state, 1984.0);
        click(&mut state, 500.0, 500.0, 2000.0);
        assert_eq!(state.phase, Phase::Ended(Outcome::Victory));
        take_events(&mut state);

        let score_before = state.score;
        let elapsed_before = state.elapsed_ms;
        click(&mut state, 500.0, 500.0, 2016.0);
        update(&mut state, TICK_MS);

        assert_eq!(state.score, score_before);
        assert_eq!(state.elapsed_ms, elapsed_before);
        assert!(take_events(&mut state).is_empty());
    }

    #[test]
    fn repeated_misses_drain_health_to_defeat() {
        // Spread far enough apart that each miss lands in its own sweep.
        let targets: Vec<(f32, f32, f64)> =
            (0..10).map(|i| (500.0, 500.0, 1000.0 + i as f64 * 400.0)).collect();
        let mut state = init(chart_with(&targets));
        tick_until(&mut state, 10_000.0);

        assert_eq!(state.miss_count, 10);
        assert_eq!(state.health, 0.0);
        assert_eq!(state.phase, Phase::Ended(Outcome::Defeat));
        let summary = summary(&state).unwrap();
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.outcome, Outcome::Defeat);
    }

    #[test]
    fn an_empty_chart_is_an_instant_victory() {
        let mut state = init(chart_with(&[]));
        update(&mut state, TICK_MS);
        assert_eq!(state.phase, Phase::Ended(Outcome::Victory));
        assert_eq!(summary(&state).unwrap().accuracy, 0.0);
    }

    #[test]
    fn snapshot_reflects_the_combo_display_rule() {
        let mut state = init(chart_with(&[(300.0, 300.0, 2000.0), (700.0, 400.0, 2400.0)]));
        assert!(!snapshot(&state).combo_visible);

        tick_until(&mut state, 1984.0);
        click(&mut state, 300.0, 300.0, 2000.0);
        assert_eq!(snapshot(&state).combo, 1);
        assert!(!snapshot(&state).combo_visible);

        tick_until(&mut state, 2384.0);
        click(&mut state, 700.0, 400.0, 2400.0);
        assert!(snapshot(&state).combo_visible);
        assert_eq!(snapshot(&state).health_percentage, 100.0);
    }
}
