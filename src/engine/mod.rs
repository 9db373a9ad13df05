//! The simulation engine: C1 (`rng`) through C6 (`summary`), wired into a
//! single `run_simulation` entry point used by the orchestrator.

pub mod normalize;
pub mod pace;
pub mod ranker;
pub mod reliability;
pub mod summary;

use crate::error::SimResult;
use crate::models::{DriverMetrics, RaceContext, SimulationSummary};
use crate::rng::Rng;

pub use normalize::NormalizationPolicy;

/// Validate the active driver set against the invariants the engine relies
/// on (spec.md §3, §8): at least two drivers, every numeric field finite,
/// unique driver ids.
pub fn validate_lineup(drivers: &[DriverMetrics]) -> SimResult<()> {
    use crate::error::SimError;
    use std::collections::HashSet;

    if drivers.len() < 2 {
        return Err(SimError::InputValidation(
            "active driver set must contain at least 2 drivers".to_string(),
        ));
    }
    if !drivers.iter().all(DriverMetrics::all_finite) {
        return Err(SimError::InputValidation(
            "one or more driver metrics are not finite".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for d in drivers {
        if !seen.insert(d.id.as_str()) {
            return Err(SimError::InputValidation(format!(
                "duplicate driver id: {}",
                d.id
            )));
        }
    }
    Ok(())
}

/// Run one full simulation end to end: validate, draw, score, rank,
/// aggregate, and build the final summary.
///
/// `seed` drives the deterministic RNG regardless of `ctx.seed` -- the
/// caller (orchestrator) is responsible for resolving `ctx.seed` down to a
/// concrete `u32` before calling in, so the same context can be replayed
/// from history with a fixed seed.
pub fn run_simulation(
    drivers: &[DriverMetrics],
    ctx: RaceContext,
    policy: NormalizationPolicy,
    seed: u32,
    elapsed_ms: impl FnOnce() -> u64,
    on_progress: impl FnMut(u8),
    should_cancel: impl FnMut() -> bool,
) -> SimResult<SimulationSummary> {
    validate_lineup(drivers)?;
    let ctx = ctx.sanitized();
    let mut rng = Rng::new(seed);

    let accumulators =
        ranker::run_ranked_simulation(drivers, &ctx, policy, &mut rng, on_progress, should_cancel)?;

    Ok(summary::build_summary(drivers, &accumulators, ctx, elapsed_ms()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SafetyCarLevel, TrackProfile, TyreStress, Weather};

    fn driver(code: &str, grid: u32, qualy: f64, long_run: f64) -> DriverMetrics {
        DriverMetrics {
            id: code.to_lowercase(),
            code: code.to_string(),
            name: code.to_string(),
            team: "Team".to_string(),
            grid_position: grid,
            qualy_gap_ms: qualy,
            long_run_pace_delta: long_run,
            straightline_index: 92.0,
            cornering_index: 96.0,
            speed_trap_kph: 342.0,
            pit_stop_median: 2.27,
            dnf_rate: 0.0,
            wet_skill: 0.95,
            consistency: 0.97,
            tyre_management: 0.9,
            aggression: 0.68,
            experience: 0.83,
            standings_points: None,
        }
    }

    fn ctx(seed: u32) -> RaceContext {
        RaceContext {
            track_profile: TrackProfile::Balanced,
            weather: Weather::Dry,
            tyre_stress: TyreStress::Medium,
            safety_car: SafetyCarLevel::Medium,
            runs: 1000,
            randomness: 0.0,
            seed: Some(seed),
        }
    }

    #[test]
    fn rejects_non_finite_metrics() {
        let mut bad = driver("A", 1, 0.0, 0.0);
        bad.qualy_gap_ms = f64::NAN;
        let drivers = vec![bad, driver("B", 2, 1.0, 1.0)];
        assert!(validate_lineup(&drivers).is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let drivers = vec![driver("A", 1, 0.0, 0.0), driver("A", 2, 1.0, 1.0)];
        assert!(validate_lineup(&drivers).is_err());
    }

    #[test]
    fn end_to_end_run_is_deterministic() {
        let drivers = vec![driver("A", 1, 0.0, -0.2), driver("B", 2, 120.0, 0.0)];
        let run = || {
            run_simulation(
                &drivers,
                ctx(99),
                NormalizationPolicy::Linear,
                99,
                || 0,
                |_| {},
                || false,
            )
            .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.results[0].code, b.results[0].code);
        assert!((a.results[0].win_probability - b.results[0].win_probability).abs() < 1e-9);
    }

    #[test]
    fn clamps_runs_outside_documented_range() {
        let drivers = vec![driver("A", 1, 0.0, 0.0), driver("B", 2, 1.0, 1.0)];
        let mut context = ctx(1);
        context.runs = 10;
        let summary = run_simulation(
            &drivers,
            context,
            NormalizationPolicy::Linear,
            1,
            || 0,
            |_| {},
            || false,
        )
        .unwrap();
        assert_eq!(summary.runs, RaceContext::MIN_RUNS);
    }
}
