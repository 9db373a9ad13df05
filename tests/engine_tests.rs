use f1_race_predictor::engine::{self, NormalizationPolicy};
use f1_race_predictor::models::{
    DriverMetrics, RaceContext, SafetyCarLevel, TrackProfile, TyreStress, Weather,
};

fn driver(code: &str, grid: u32, qualy_gap_ms: f64, long_run_pace_delta: f64, dnf_rate: f64) -> DriverMetrics {
    DriverMetrics {
        id: code.to_lowercase(),
        code: code.to_string(),
        name: code.to_string(),
        team: "Team".to_string(),
        grid_position: grid,
        qualy_gap_ms,
        long_run_pace_delta,
        straightline_index: 92.0,
        cornering_index: 94.0,
        speed_trap_kph: 340.0,
        pit_stop_median: 2.3,
        dnf_rate,
        wet_skill: 0.9,
        consistency: 0.9,
        tyre_management: 0.9,
        aggression: 0.6,
        experience: 0.8,
        standings_points: None,
    }
}

fn context(seed: u32, runs: u32) -> RaceContext {
    RaceContext {
        track_profile: TrackProfile::Balanced,
        weather: Weather::Dry,
        tyre_stress: TyreStress::Medium,
        safety_car: SafetyCarLevel::Medium,
        runs,
        randomness: 0.25,
        seed: Some(seed),
    }
}

#[test]
fn same_seed_produces_bit_identical_probabilities() {
    let drivers = vec![
        driver("A", 1, 0.0, -0.2, 0.02),
        driver("B", 2, 80.0, 0.0, 0.03),
        driver("C", 3, 150.0, 0.05, 0.04),
    ];

    let run = || {
        engine::run_simulation(
            &drivers,
            context(1234, 4000),
            NormalizationPolicy::Linear,
            1234,
            || 0,
            |_| {},
            || false,
        )
        .unwrap()
    };

    let first = run();
    let second = run();

    for (a, b) in first.results.iter().zip(second.results.iter()) {
        assert_eq!(a.code, b.code);
        assert_eq!(a.win_probability, b.win_probability);
        assert_eq!(a.average_finish, b.average_finish);
        assert_eq!(a.expected_points, b.expected_points);
    }
}

#[test]
fn win_probabilities_form_a_simplex() {
    let drivers = vec![
        driver("A", 1, 0.0, -0.3, 0.01),
        driver("B", 2, 60.0, -0.1, 0.02),
        driver("C", 3, 140.0, 0.1, 0.05),
        driver("D", 4, 300.0, 0.2, 0.08),
    ];
    let summary = engine::run_simulation(
        &drivers,
        context(7, 5000),
        NormalizationPolicy::Linear,
        7,
        || 0,
        |_| {},
        || false,
    )
    .unwrap();

    let total: f64 = summary.results.iter().map(|r| r.win_probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!(summary.results.iter().all(|r| r.win_probability >= 0.0 && r.win_probability <= 1.0));
}

#[test]
fn results_are_sorted_by_win_probability_then_average_finish() {
    let drivers = vec![
        driver("A", 1, 0.0, -0.3, 0.01),
        driver("B", 2, 60.0, -0.1, 0.02),
        driver("C", 3, 140.0, 0.1, 0.05),
    ];
    let summary = engine::run_simulation(
        &drivers,
        context(9, 3000),
        NormalizationPolicy::Linear,
        9,
        || 0,
        |_| {},
        || false,
    )
    .unwrap();

    for window in summary.results.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        assert!(
            a.win_probability > b.win_probability
                || (a.win_probability == b.win_probability && a.average_finish <= b.average_finish)
        );
    }
}

#[test]
fn high_dnf_rate_driver_dominates_dnf_probability() {
    let drivers = vec![
        driver("UNR", 1, 0.0, 0.0, 0.9),
        driver("REL", 2, 50.0, 0.0, 0.01),
    ];
    let summary = engine::run_simulation(
        &drivers,
        context(3, 4000),
        NormalizationPolicy::Linear,
        3,
        || 0,
        |_| {},
        || false,
    )
    .unwrap();

    let unreliable = summary.results.iter().find(|r| r.code == "UNR").unwrap();
    let reliable = summary.results.iter().find(|r| r.code == "REL").unwrap();
    assert!(unreliable.dnf_probability > reliable.dnf_probability);
    assert!(unreliable.dnf_probability > 0.5);
}

#[test]
fn context_runs_outside_bounds_are_clamped_before_simulating() {
    let drivers = vec![driver("A", 1, 0.0, 0.0, 0.0), driver("B", 2, 1.0, 0.0, 0.0)];
    let mut ctx = context(1, 1);
    ctx.runs = 1;
    let summary = engine::run_simulation(
        &drivers,
        ctx,
        NormalizationPolicy::Linear,
        1,
        || 0,
        |_| {},
        || false,
    )
    .unwrap();
    assert_eq!(summary.runs, RaceContext::MIN_RUNS);
}
