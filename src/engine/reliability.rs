//! Reliability Sampler (C4): per-driver, per-run finish/DNF decision
//! (spec.md §4.4).

use crate::models::{RaceContext, SafetyCarLevel, TyreStress, Weather};
use crate::rng::Rng;

/// `1 + weather/tyre-stress/safety-car surcharges` applied to `dnfRate`
/// before clamping into `[0.04, 0.98]`.
pub fn reliability_amplifier(ctx: &RaceContext) -> f64 {
    let weather_term = if matches!(ctx.weather, Weather::Wet) {
        0.08
    } else {
        0.0
    };
    let tyre_term = if matches!(ctx.tyre_stress, TyreStress::High) {
        0.05
    } else {
        0.0
    };
    let sc_term = match ctx.safety_car {
        SafetyCarLevel::Medium => 0.01,
        SafetyCarLevel::High => 0.02,
        SafetyCarLevel::Low => 0.0,
    };
    1.0 + weather_term + tyre_term + sc_term
}

pub fn base_reliability(dnf_rate: f64, amplifier: f64) -> f64 {
    (1.0 - dnf_rate * amplifier).clamp(0.04, 0.98)
}

/// Draw the finish/DNF decision for one driver in one run. Consumes exactly
/// one uniform (spec.md §4.4, §5 ordering guarantee).
pub fn draw_finishes(rng: &mut Rng, reliability: f64) -> bool {
    rng.next() < reliability
}
