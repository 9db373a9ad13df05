//! Run Ranker & Aggregator (C5): the per-run draw/score/sort/accumulate
//! loop (spec.md §4.5).
//!
//! RNG consumption order within one run is fixed (spec.md §5): for each
//! driver in index order, one reliability uniform; then, once per run, a
//! batch of `|active|` normal draws for the noise term. Progress ticks fire
//! every `max(1, runs/20)` iterations; `should_cancel` is polled at the same
//! cadence, satisfying the "suspend only at progress ticks" rule.

use crate::engine::pace::{run_score, ContextWeights, PaceDescriptors};
use crate::engine::normalize::NormalizationPolicy;
use crate::engine::reliability::{base_reliability, draw_finishes, reliability_amplifier};
use crate::error::{SimError, SimResult};
use crate::models::{DriverMetrics, RaceContext};
use crate::rng::Rng;

pub const POINTS_TABLE: [f64; 10] = [25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0];

/// Running totals for one driver across all runs of a simulation.
#[derive(Debug, Clone, Default)]
pub struct DriverAccumulator {
    pub total_finish: f64,
    pub total_finish_sq: f64,
    pub best_finish: u32,
    pub worst_finish: u32,
    pub wins: u32,
    pub podiums: u32,
    pub points: f64,
    pub dnfs: u32,
}

impl DriverAccumulator {
    fn new() -> Self {
        DriverAccumulator {
            best_finish: u32::MAX,
            worst_finish: 0,
            ..Default::default()
        }
    }

    fn record(&mut self, recorded_position: u32, actual_rank: u32, finished: bool) {
        self.total_finish += recorded_position as f64;
        self.total_finish_sq += (recorded_position as f64).powi(2);
        self.best_finish = self.best_finish.min(recorded_position);
        self.worst_finish = self.worst_finish.max(recorded_position);

        if actual_rank == 1 {
            self.wins += 1;
        }
        if actual_rank <= 3 {
            self.podiums += 1;
        }
        if actual_rank as usize <= 10 {
            self.points += POINTS_TABLE[actual_rank as usize - 1];
        }
        if !finished {
            self.dnfs += 1;
        }
    }
}

/// Run the full Monte Carlo loop and return one accumulator per driver, in
/// the same order as the input slice.
///
/// `on_progress` receives an integer percent-complete tick. `should_cancel`
/// is polled at the same cadence; if it ever returns `true` the loop stops
/// and `SimError::Cancelled` is returned (partial accumulator state is
/// discarded by the caller, per spec.md §5 cancellation semantics).
pub fn run_ranked_simulation(
    drivers: &[DriverMetrics],
    ctx: &RaceContext,
    policy: NormalizationPolicy,
    rng: &mut Rng,
    mut on_progress: impl FnMut(u8),
    mut should_cancel: impl FnMut() -> bool,
) -> SimResult<Vec<DriverAccumulator>> {
    if drivers.len() < 2 {
        return Err(SimError::InputValidation(
            "active driver set must contain at least 2 drivers".to_string(),
        ));
    }

    let active_len = drivers.len();
    let sentinel_position = (active_len + 1) as u32;

    let descriptors = PaceDescriptors::from_drivers(drivers);
    let weights = ContextWeights::from_context(ctx);
    let noise_sigma = weights.noise_sigma(ctx.randomness);

    let base_scores: Vec<f64> = drivers
        .iter()
        .map(|d| crate::engine::pace::base_score(d, &descriptors, &weights, policy))
        .collect();

    let amplifier = reliability_amplifier(ctx);
    let reliabilities: Vec<f64> = drivers
        .iter()
        .map(|d| base_reliability(d.dnf_rate, amplifier))
        .collect();

    let mut accumulators: Vec<DriverAccumulator> =
        (0..active_len).map(|_| DriverAccumulator::new()).collect();

    let runs = ctx.runs;
    let tick_every = (runs / 20).max(1);

    for run_index in 0..runs {
        // Reliability draws, strictly in driver index order.
        let finishes: Vec<bool> = (0..active_len)
            .map(|i| draw_finishes(rng, reliabilities[i]))
            .collect();

        // Noise batch, one normal per driver, drawn after all reliability
        // draws for this run.
        let noise = rng.normal_batch(active_len, 0.0, noise_sigma);

        let mut scored: Vec<(usize, f64)> = (0..active_len)
            .map(|i| (i, run_score(base_scores[i], finishes[i], noise[i])))
            .collect();

        // Stable sort descending by score; ties keep input-index order
        // (spec.md §4.3 tie-break rule).
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for (rank_minus_one, &(driver_idx, _score)) in scored.iter().enumerate() {
            let actual_rank = (rank_minus_one + 1) as u32;
            let finished = finishes[driver_idx];
            let recorded_position = if finished {
                actual_rank
            } else {
                sentinel_position
            };
            accumulators[driver_idx].record(recorded_position, actual_rank, finished);
        }

        let completed = run_index + 1;
        if completed % tick_every == 0 || completed == runs {
            let percent = ((completed as u64 * 100) / runs as u64) as u8;
            on_progress(percent.min(100));
            if should_cancel() {
                return Err(SimError::Cancelled);
            }
        }
    }

    Ok(accumulators)
}
