use f1_race_predictor::engine::{self, NormalizationPolicy};
use f1_race_predictor::ingest;
use f1_race_predictor::models::{
    FactorTarget, FactorTargetType, ImpactType, RaceContext, SafetyCarLevel, TrackProfile,
    TyreStress, VariationFactor, Weather,
};
use f1_race_predictor::variation;

const LINEUP_CSV: &str = "driver_name,team_name,grid_position,qualy_gap_ms,fp_longrun_pace_s,straightline_index,cornering_index,speed_trap_kph,pit_crew_mean_s,dnf_rate\n\
Max Verstappen,Red Bull,1,0,-0.3,95,97,344,2.2,0.02\n\
Lando Norris,McLaren,2,60,-0.1,91,98,338,2.3,0.03\n\
Charles Leclerc,Ferrari,3,140,-0.05,93,95,342,2.25,0.04\n";

fn context() -> RaceContext {
    RaceContext {
        track_profile: TrackProfile::Balanced,
        weather: Weather::Dry,
        tyre_stress: TyreStress::Medium,
        safety_car: SafetyCarLevel::Medium,
        runs: 4000,
        randomness: 0.2,
        seed: Some(11),
    }
}

#[test]
fn csv_ingest_feeds_directly_into_the_engine() {
    let drivers = ingest::ingest_csv_str(LINEUP_CSV).unwrap();
    assert_eq!(drivers.len(), 3);

    let summary = engine::run_simulation(
        &drivers,
        context(),
        NormalizationPolicy::Linear,
        11,
        || 0,
        |_| {},
        || false,
    )
    .unwrap();

    assert_eq!(summary.results.len(), 3);
    assert!(summary.predicted_winner().is_some());
}

#[test]
fn a_pace_factor_targeting_a_driver_improves_their_standing() {
    let drivers = ingest::ingest_csv_str(LINEUP_CSV).unwrap();

    let boost = VariationFactor {
        id: "upgrade".to_string(),
        label: "Leclerc aero upgrade".to_string(),
        description: "new floor from round 8".to_string(),
        impact_type: ImpactType::Pace,
        targets: vec![FactorTarget {
            target_type: FactorTargetType::Driver,
            id: "LEC".to_string(),
        }],
        magnitude: 5.0,
        enabled: true,
    };

    let baseline_ctx = context();
    let (baseline_drivers, baseline_adjusted_ctx) = variation::apply_factors(&drivers, &baseline_ctx, &[]);
    let (boosted_drivers, boosted_ctx) = variation::apply_factors(&drivers, &baseline_ctx, &[boost]);

    let baseline_summary = engine::run_simulation(
        &baseline_drivers,
        baseline_adjusted_ctx,
        NormalizationPolicy::Linear,
        11,
        || 0,
        |_| {},
        || false,
    )
    .unwrap();
    let boosted_summary = engine::run_simulation(
        &boosted_drivers,
        boosted_ctx,
        NormalizationPolicy::Linear,
        11,
        || 0,
        |_| {},
        || false,
    )
    .unwrap();

    let baseline_lec = baseline_summary.results.iter().find(|r| r.code == "LEC").unwrap();
    let boosted_lec = boosted_summary.results.iter().find(|r| r.code == "LEC").unwrap();
    assert!(boosted_lec.win_probability > baseline_lec.win_probability);
}

#[test]
fn csv_export_round_trips_through_ingest() {
    let drivers = ingest::ingest_csv_str(LINEUP_CSV).unwrap();
    let exported = ingest::export_csv(&drivers).unwrap();
    let reimported = ingest::export_csv(&ingest::ingest_csv_str(&exported).unwrap()).unwrap();
    assert_eq!(exported, reimported);
}
