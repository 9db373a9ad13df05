//! Variation Applicator (C7): folds news-derived `VariationFactor`s into a
//! driver lineup and race context before the engine ever sees them
//! (spec.md §4.7).
//!
//! Pace factors fold into `longRunPaceDelta` rather than a separate
//! team-strength weight (an Open Question resolved in `SPEC_FULL.md` §9),
//! via the fixed `paceMultiplier = clamp(1 + 0.12*magnitude, 0.6, 1.5)`
//! (spec.md §4.7).

use crate::models::{DriverMetrics, ImpactType, RaceContext, VariationFactor};

/// Coefficient and bounds of the pace-factor multiplier applied to
/// `longRunPaceDelta` (spec.md §4.7).
const PACE_FOLD_COEFFICIENT: f64 = 0.12;
const PACE_FOLD_MIN: f64 = 0.6;
const PACE_FOLD_MAX: f64 = 1.5;
/// How strongly one unit of `magnitude` moves `dnfRate`.
const RELIABILITY_FOLD_SCALE: f64 = 0.05;
/// Upper clamp on `dnfRate` after a reliability factor is applied.
const RELIABILITY_FOLD_MAX: f64 = 0.6;
/// Grid positions shifted per unit of `magnitude`.
const QUALY_SHIFT_SCALE: f64 = 2.0;
/// How strongly one unit of `magnitude` moves context `randomness`.
const STRATEGY_FOLD_SCALE: f64 = 0.15;

/// Apply every enabled factor whose targets match a driver, to a cloned
/// lineup and context. Factors never mutate the caller's originals --
/// the orchestrator keeps the unmodified lineup in `SimulationRun` and
/// hands this function's output to the engine.
pub fn apply_factors(
    drivers: &[DriverMetrics],
    ctx: &RaceContext,
    factors: &[VariationFactor],
) -> (Vec<DriverMetrics>, RaceContext) {
    let active: Vec<&VariationFactor> = factors.iter().filter(|f| f.enabled).collect();

    let mut adjusted_ctx = ctx.clone();
    for factor in active.iter().filter(|f| f.impact_type == ImpactType::Strategy) {
        adjusted_ctx.randomness =
            (adjusted_ctx.randomness + factor.magnitude * STRATEGY_FOLD_SCALE).clamp(0.0, 1.0);
    }

    let adjusted_drivers = drivers
        .iter()
        .map(|driver| {
            let mut d = driver.clone();
            for factor in &active {
                if !factor.matches_driver(&d) {
                    continue;
                }
                match factor.impact_type {
                    ImpactType::Pace => {
                        let multiplier = (1.0 + PACE_FOLD_COEFFICIENT * factor.magnitude)
                            .clamp(PACE_FOLD_MIN, PACE_FOLD_MAX);
                        d.long_run_pace_delta *= multiplier;
                    }
                    ImpactType::Reliability => {
                        d.dnf_rate = (d.dnf_rate - factor.magnitude * RELIABILITY_FOLD_SCALE)
                            .clamp(0.0, RELIABILITY_FOLD_MAX);
                    }
                    ImpactType::Qualifying => {
                        let shift = (factor.magnitude * QUALY_SHIFT_SCALE).round() as i64;
                        let shifted = d.grid_position as i64 - shift;
                        d.grid_position = shifted.max(1) as u32;
                    }
                    ImpactType::Strategy => {
                        // Context-level, already folded above.
                    }
                }
            }
            d
        })
        .collect();

    (adjusted_drivers, adjusted_ctx)
}
