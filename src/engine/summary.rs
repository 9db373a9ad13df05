//! Summary Builder (C6): turns per-driver accumulators into the final,
//! sorted `SimulationSummary` (spec.md §4.6).

use crate::engine::ranker::DriverAccumulator;
use crate::models::{DriverMetrics, DriverResult, PerformanceMetrics, RaceContext, SimulationSummary};

/// Build one `DriverResult` from a driver's raw accumulator.
fn build_result(driver: &DriverMetrics, acc: &DriverAccumulator, runs: u32) -> DriverResult {
    let runs_f = runs as f64;
    let average_finish = acc.total_finish / runs_f;
    let variance = (acc.total_finish_sq / runs_f) - average_finish.powi(2);

    // Consistency index: 1 at zero spread, decaying to 0 as variance
    // reaches the fixed normalising factor of 12 (spec.md §4.6).
    let consistency_index = (1.0 - variance / 12.0).clamp(0.0, 1.0);

    DriverResult {
        driver_id: driver.id.clone(),
        code: driver.code.clone(),
        name: driver.name.clone(),
        team: driver.team.clone(),
        win_probability: acc.wins as f64 / runs_f,
        podium_probability: acc.podiums as f64 / runs_f,
        dnf_probability: acc.dnfs as f64 / runs_f,
        average_finish,
        expected_points: acc.points / runs_f,
        best_finish: acc.best_finish,
        worst_finish: acc.worst_finish,
        consistency_index,
    }
}

/// Build the final summary: one result row per driver, sorted by
/// `winProbability` descending, then `averageFinish` ascending
/// (spec.md §4.6 final sort).
pub fn build_summary(
    drivers: &[DriverMetrics],
    accumulators: &[DriverAccumulator],
    ctx: RaceContext,
    elapsed_ms: u64,
) -> SimulationSummary {
    let active_len = drivers.len();
    let mut results: Vec<DriverResult> = drivers
        .iter()
        .zip(accumulators.iter())
        .map(|(d, acc)| build_result(d, acc, ctx.runs))
        .collect();

    results.sort_by(|a, b| {
        b.win_probability
            .partial_cmp(&a.win_probability)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.average_finish
                    .partial_cmp(&b.average_finish)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    let performance_metrics = PerformanceMetrics {
        active_driver_count: active_len,
        total_runs: ctx.runs,
        elapsed_ms,
    };

    SimulationSummary {
        results,
        runs: ctx.runs,
        context: ctx,
        performance_metrics,
    }
}
