//! Pace Scorer (C3): deterministic base score plus per-run stochastic score
//! (spec.md §4.3).

use crate::engine::normalize::{MetricDescriptor, NormalizationPolicy};
use crate::models::{DriverMetrics, RaceContext, SafetyCarLevel, TrackProfile, TyreStress, Weather};

/// Context-derived multipliers, precomputed once per simulation.
#[derive(Debug, Clone, Copy)]
pub struct ContextWeights {
    pub w_straightline: f64,
    pub w_cornering: f64,
    pub w_wet: f64,
    pub w_noise: f64,
    pub tyre_factor: f64,
    pub sc_factor: f64,
}

impl ContextWeights {
    pub fn from_context(ctx: &RaceContext) -> Self {
        let (w_straightline, w_cornering) = match ctx.track_profile {
            TrackProfile::Balanced => (1.0, 1.0),
            TrackProfile::Power => (1.25, 0.9),
            TrackProfile::Technical => (0.92, 1.25),
        };
        let (w_wet, w_noise) = match ctx.weather {
            Weather::Dry => (0.85, 0.85),
            Weather::Mixed => (1.0, 1.0),
            Weather::Wet => (1.25, 1.2),
        };
        let tyre_factor = match ctx.tyre_stress {
            TyreStress::Low => 0.92,
            TyreStress::Medium => 1.0,
            TyreStress::High => 1.12,
        };
        let sc_factor = match ctx.safety_car {
            SafetyCarLevel::Low => 0.88,
            SafetyCarLevel::Medium => 1.0,
            SafetyCarLevel::High => 1.18,
        };
        ContextWeights {
            w_straightline,
            w_cornering,
            w_wet,
            w_noise,
            tyre_factor,
            sc_factor,
        }
    }

    /// Per-run noise standard deviation (spec.md §4.3).
    pub fn noise_sigma(&self, randomness: f64) -> f64 {
        (0.35 + 0.45 * randomness) * self.w_noise * self.sc_factor
    }
}

/// Precomputed normalisation descriptors for every metric the pace score
/// reads, over one active driver set.
pub struct PaceDescriptors {
    pub long_run: MetricDescriptor,
    pub qualy_gap: MetricDescriptor,
    pub grid: MetricDescriptor,
    pub straightline: MetricDescriptor,
    pub cornering: MetricDescriptor,
    pub pit_stop: MetricDescriptor,
    pub speed_trap: MetricDescriptor,
}

impl PaceDescriptors {
    pub fn from_drivers(drivers: &[DriverMetrics]) -> Self {
        let grid: Vec<f64> = drivers.iter().map(|d| d.grid_position as f64).collect();
        PaceDescriptors {
            long_run: MetricDescriptor::from_values(
                &drivers.iter().map(|d| d.long_run_pace_delta).collect::<Vec<_>>(),
            ),
            qualy_gap: MetricDescriptor::from_values(
                &drivers.iter().map(|d| d.qualy_gap_ms).collect::<Vec<_>>(),
            ),
            grid: MetricDescriptor::from_values(&grid),
            straightline: MetricDescriptor::from_values(
                &drivers.iter().map(|d| d.straightline_index).collect::<Vec<_>>(),
            ),
            cornering: MetricDescriptor::from_values(
                &drivers.iter().map(|d| d.cornering_index).collect::<Vec<_>>(),
            ),
            pit_stop: MetricDescriptor::from_values(
                &drivers.iter().map(|d| d.pit_stop_median).collect::<Vec<_>>(),
            ),
            speed_trap: MetricDescriptor::from_values(
                &drivers.iter().map(|d| d.speed_trap_kph).collect::<Vec<_>>(),
            ),
        }
    }
}

/// The deterministic component of one driver's score, computed once at
/// simulation start (spec.md §4.3).
pub fn base_score(
    driver: &DriverMetrics,
    descriptors: &PaceDescriptors,
    weights: &ContextWeights,
    policy: NormalizationPolicy,
) -> f64 {
    let norm_long_run = policy.normalize(driver.long_run_pace_delta, &descriptors.long_run, true);
    let norm_qualy = policy.normalize(driver.qualy_gap_ms, &descriptors.qualy_gap, true);
    let norm_grid = policy.normalize(driver.grid_position as f64, &descriptors.grid, true);
    let norm_straightline =
        policy.normalize(driver.straightline_index, &descriptors.straightline, false);
    let norm_cornering = policy.normalize(driver.cornering_index, &descriptors.cornering, false);
    // pit_stop is normalized *without* inversion here; the formula below
    // inverts it explicitly via `1 - norm_pit_stop` (spec.md §4.3).
    let norm_pit_stop = policy.normalize(driver.pit_stop_median, &descriptors.pit_stop, false);
    let norm_speed_trap = policy.normalize(driver.speed_trap_kph, &descriptors.speed_trap, false);

    0.28 * norm_long_run
        + 0.20 * norm_qualy
        + 0.10 * norm_grid
        + 0.10 * (norm_straightline * weights.w_straightline)
        + 0.10 * (norm_cornering * weights.w_cornering)
        + 0.06 * (1.0 - norm_pit_stop)
        + 0.05 * norm_speed_trap * weights.w_straightline
        + 0.05 * driver.consistency
        + 0.03 * driver.aggression
        + 0.03 * (driver.tyre_management * weights.tyre_factor).clamp(0.0, 1.1)
        + 0.04 * driver.wet_skill * weights.w_wet
}

/// The full per-run score for one driver: deterministic base plus
/// stochastic noise, or the DNF floor if this run the driver does not
/// finish (spec.md §4.3).
pub fn run_score(base: f64, finishes: bool, noise: f64) -> f64 {
    if finishes {
        base + noise
    } else {
        -5.0 + 0.5 * noise
    }
}
