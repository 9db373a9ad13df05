//! Core data model (spec.md §3): driver metrics, race context, variation
//! factors, run lifecycle records, and simulation results.

use serde::{Deserialize, Serialize};

/// One row of per-driver performance metrics. The active set for a single
/// simulation must contain at least two rows with all numeric fields
/// finite -- callers (ingest, CLI) are responsible for enforcing that
/// invariant before handing a slice to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverMetrics {
    pub id: String,
    pub code: String,
    pub name: String,
    pub team: String,

    pub grid_position: u32,
    pub qualy_gap_ms: f64,

    pub long_run_pace_delta: f64,
    pub straightline_index: f64,
    pub cornering_index: f64,
    pub speed_trap_kph: f64,

    pub pit_stop_median: f64,

    pub dnf_rate: f64,

    pub wet_skill: f64,
    pub consistency: f64,
    pub tyre_management: f64,
    pub aggression: f64,
    pub experience: f64,

    /// Optional prior, e.g. current championship points; not consumed by
    /// the scoring formula itself but carried through for future weighting.
    pub standings_points: Option<f64>,
}

impl DriverMetrics {
    /// True iff every numeric field is finite (spec.md §3 invariant).
    pub fn all_finite(&self) -> bool {
        let scalars = [
            self.qualy_gap_ms,
            self.long_run_pace_delta,
            self.straightline_index,
            self.cornering_index,
            self.speed_trap_kph,
            self.pit_stop_median,
            self.dnf_rate,
            self.wet_skill,
            self.consistency,
            self.tyre_management,
            self.aggression,
            self.experience,
        ];
        scalars.iter().all(|v| v.is_finite())
            && self.standings_points.map(|v| v.is_finite()).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrackProfile {
    Balanced,
    Power,
    Technical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Dry,
    Mixed,
    Wet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TyreStress {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SafetyCarLevel {
    Low,
    Medium,
    High,
}

/// Race-level context shared by every driver in one simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceContext {
    pub track_profile: TrackProfile,
    pub weather: Weather,
    pub tyre_stress: TyreStress,
    pub safety_car: SafetyCarLevel,
    pub runs: u32,
    pub randomness: f64,
    pub seed: Option<u32>,
}

impl RaceContext {
    pub const MIN_RUNS: u32 = 500;
    pub const MAX_RUNS: u32 = 20_000;

    /// Clamp `runs`/`randomness` into their documented ranges (spec.md §4.8,
    /// §8 "clamp laws"). Called by the orchestrator before the engine ever
    /// observes the context.
    pub fn sanitized(mut self) -> Self {
        self.runs = self.runs.clamp(Self::MIN_RUNS, Self::MAX_RUNS);
        self.randomness = self.randomness.clamp(0.0, 1.0);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactType {
    Pace,
    Reliability,
    Qualifying,
    Strategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorTargetType {
    Driver,
    Team,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorTarget {
    #[serde(rename = "type")]
    pub target_type: FactorTargetType,
    pub id: String,
}

/// A news-derived adjustment, consumed by the Variation Applicator (C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationFactor {
    pub id: String,
    pub label: String,
    pub description: String,
    pub impact_type: ImpactType,
    #[serde(default)]
    pub targets: Vec<FactorTarget>,
    pub magnitude: f64,
    pub enabled: bool,
}

impl VariationFactor {
    /// Does this factor apply to the given driver? Empty `targets` matches
    /// everyone; matching is case-insensitive on driver code or team
    /// substring (spec.md §4.7).
    pub fn matches_driver(&self, driver: &DriverMetrics) -> bool {
        if self.targets.is_empty() {
            return true;
        }
        self.targets.iter().any(|t| match t.target_type {
            FactorTargetType::Driver => t.id.eq_ignore_ascii_case(&driver.code),
            FactorTargetType::Team => driver.team.to_lowercase().contains(&t.id.to_lowercase()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Lifecycle record for one submitted simulation, owned by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    pub id: u64,
    pub status: RunStatus,
    pub context: RaceContext,
    pub lineup: Vec<DriverMetrics>,
    pub applied_factors: Vec<VariationFactor>,
    pub seed: u32,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub message: Option<String>,
    pub result: Option<SimulationSummary>,
}

/// Per-driver results within a `SimulationSummary`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverResult {
    pub driver_id: String,
    pub code: String,
    pub name: String,
    pub team: String,

    pub win_probability: f64,
    pub podium_probability: f64,
    pub dnf_probability: f64,

    pub average_finish: f64,
    pub expected_points: f64,

    pub best_finish: u32,
    pub worst_finish: u32,

    pub consistency_index: f64,
}

/// Extra, non-per-driver statistics surfaced alongside the ranking.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerformanceMetrics {
    pub active_driver_count: usize,
    pub total_runs: u32,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub results: Vec<DriverResult>,
    pub context: RaceContext,
    pub runs: u32,
    pub performance_metrics: PerformanceMetrics,
}

impl SimulationSummary {
    pub fn predicted_winner(&self) -> Option<&DriverResult> {
        self.results.first()
    }

    pub fn predicted_podium(&self) -> &[DriverResult] {
        let len = self.results.len().min(3);
        &self.results[..len]
    }
}
