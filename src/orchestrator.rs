//! Orchestrator (C8): submission, background execution, progress streaming,
//! cancellation, timeout, and bounded run history (spec.md §5).
//!
//! The host this crate targets is a synchronous CLI, so the "executor" the
//! spec describes is realized with `std::thread` + `std::sync::mpsc` +
//! `Arc<AtomicBool>` rather than an async runtime -- the permitted
//! simplification spec.md §9 calls out explicitly.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::engine::{self, NormalizationPolicy};
use crate::error::{SimError, SimResult};
use crate::models::{DriverMetrics, RaceContext, RunStatus, SimulationRun, VariationFactor};
use crate::variation;

pub const HISTORY_LIMIT: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct ProgressEvent {
    pub run_id: u64,
    pub percent: u8,
}

struct Inner {
    next_id: AtomicU64,
    busy: AtomicBool,
    runs: Mutex<HashMap<u64, Arc<Mutex<SimulationRun>>>>,
    history: Mutex<VecDeque<u64>>,
    cancel_flags: Mutex<HashMap<u64, Arc<AtomicBool>>>,
    progress_tx: Sender<ProgressEvent>,
    progress_rx: Mutex<Receiver<ProgressEvent>>,
    timeout: Duration,
    cooldown: Duration,
    last_factor_refresh: Mutex<Option<Instant>>,
}

/// Cheaply cloneable handle onto a single shared orchestrator. Submitting a
/// run while one is already in flight is rejected (`is_busy` guard) --
/// spec.md §5 has exactly one active run at a time per orchestrator.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_TIMEOUT, DEFAULT_COOLDOWN)
    }

    pub fn with_limits(timeout: Duration, cooldown: Duration) -> Self {
        let (progress_tx, progress_rx) = mpsc::channel();
        Orchestrator {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                busy: AtomicBool::new(false),
                runs: Mutex::new(HashMap::new()),
                history: Mutex::new(VecDeque::new()),
                cancel_flags: Mutex::new(HashMap::new()),
                progress_tx,
                progress_rx: Mutex::new(progress_rx),
                timeout,
                cooldown,
                last_factor_refresh: Mutex::new(None),
            }),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst)
    }

    /// Submit a new simulation. Variation factors are folded into a cloned
    /// lineup/context before the engine runs; the run record keeps the
    /// original, unmodified lineup (spec.md §4.7).
    pub fn submit(
        &self,
        drivers: Vec<DriverMetrics>,
        ctx: RaceContext,
        factors: Vec<VariationFactor>,
        policy: NormalizationPolicy,
        seed: Option<u32>,
    ) -> SimResult<u64> {
        if self.inner.busy.swap(true, Ordering::SeqCst) {
            return Err(SimError::InputValidation(
                "orchestrator is already running a simulation".to_string(),
            ));
        }

        if let Err(e) = engine::validate_lineup(&drivers) {
            self.inner.busy.store(false, Ordering::SeqCst);
            return Err(e);
        }

        let resolved_seed = seed.unwrap_or_else(rand::random::<u32>);
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let sanitized_ctx = ctx.clone().sanitized();
        let (adjusted_drivers, adjusted_ctx) =
            variation::apply_factors(&drivers, &sanitized_ctx, &factors);

        let run = SimulationRun {
            id,
            status: RunStatus::Running,
            context: sanitized_ctx,
            lineup: drivers,
            applied_factors: factors,
            seed: resolved_seed,
            started_at: chrono::Utc::now(),
            finished_at: None,
            message: None,
            result: None,
        };
        let run_handle = Arc::new(Mutex::new(run));
        self.inner.runs.lock().unwrap().insert(id, run_handle.clone());

        let cancel_flag = Arc::new(AtomicBool::new(false));
        self.inner
            .cancel_flags
            .lock()
            .unwrap()
            .insert(id, cancel_flag.clone());

        let progress_tx = self.inner.progress_tx.clone();
        let timeout = self.inner.timeout;
        let inner = self.inner.clone();

        thread::spawn(move || {
            let start = Instant::now();
            let result = engine::run_simulation(
                &adjusted_drivers,
                adjusted_ctx,
                policy,
                resolved_seed,
                || start.elapsed().as_millis() as u64,
                |percent| {
                    let _ = progress_tx.send(ProgressEvent { run_id: id, percent });
                },
                || cancel_flag.load(Ordering::SeqCst) || start.elapsed() > timeout,
            );

            {
                let mut run = run_handle.lock().unwrap();
                run.finished_at = Some(chrono::Utc::now());
                match result {
                    Ok(summary) => {
                        run.status = RunStatus::Completed;
                        run.result = Some(summary);
                    }
                    Err(SimError::Cancelled) => {
                        if cancel_flag.load(Ordering::SeqCst) {
                            run.status = RunStatus::Cancelled;
                            run.message = Some("cancelled by caller".to_string());
                        } else {
                            let timeout_err = SimError::Timeout(start.elapsed().as_millis() as u64);
                            run.status = RunStatus::Failed;
                            run.message = Some(timeout_err.to_string());
                        }
                    }
                    Err(e) => {
                        run.status = RunStatus::Failed;
                        run.message = Some(e.to_string());
                    }
                }
            }

            inner.busy.store(false, Ordering::SeqCst);
            inner.cancel_flags.lock().unwrap().remove(&id);

            let mut history = inner.history.lock().unwrap();
            history.push_back(id);
            while history.len() > HISTORY_LIMIT {
                if let Some(evicted) = history.pop_front() {
                    inner.runs.lock().unwrap().remove(&evicted);
                }
            }
        });

        Ok(id)
    }

    /// Request cancellation of a run. Returns `false` if the run id is
    /// unknown or already finished.
    pub fn cancel(&self, run_id: u64) -> bool {
        match self.inner.cancel_flags.lock().unwrap().get(&run_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub fn status(&self, run_id: u64) -> Option<RunStatus> {
        self.inner
            .runs
            .lock()
            .unwrap()
            .get(&run_id)
            .map(|r| r.lock().unwrap().status)
    }

    pub fn snapshot(&self, run_id: u64) -> Option<SimulationRun> {
        self.inner
            .runs
            .lock()
            .unwrap()
            .get(&run_id)
            .map(|r| r.lock().unwrap().clone())
    }

    /// Drain every progress event received so far without blocking.
    pub fn drain_progress(&self) -> Vec<ProgressEvent> {
        let rx = self.inner.progress_rx.lock().unwrap();
        rx.try_iter().collect()
    }

    /// Bounded run history, most recent first, capped at `HISTORY_LIMIT`.
    pub fn history(&self) -> Vec<SimulationRun> {
        let ids: Vec<u64> = self.inner.history.lock().unwrap().iter().rev().copied().collect();
        let runs = self.inner.runs.lock().unwrap();
        ids.iter()
            .filter_map(|id| runs.get(id).map(|r| r.lock().unwrap().clone()))
            .collect()
    }

    /// Whether enough time has passed since the last factor refresh to
    /// allow another one (spec.md §5 cooldown).
    pub fn can_refresh_factors(&self) -> bool {
        match *self.inner.last_factor_refresh.lock().unwrap() {
            None => true,
            Some(last) => last.elapsed() >= self.inner.cooldown,
        }
    }

    pub fn mark_factors_refreshed(&self) {
        *self.inner.last_factor_refresh.lock().unwrap() = Some(Instant::now());
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SafetyCarLevel, TrackProfile, TyreStress, Weather};
    use std::time::Duration;

    fn driver(code: &str, grid: u32, qualy: f64) -> DriverMetrics {
        DriverMetrics {
            id: code.to_lowercase(),
            code: code.to_string(),
            name: code.to_string(),
            team: "Team".to_string(),
            grid_position: grid,
            qualy_gap_ms: qualy,
            long_run_pace_delta: 0.0,
            straightline_index: 90.0,
            cornering_index: 90.0,
            speed_trap_kph: 330.0,
            pit_stop_median: 2.3,
            dnf_rate: 0.02,
            wet_skill: 0.9,
            consistency: 0.9,
            tyre_management: 0.9,
            aggression: 0.5,
            experience: 0.8,
            standings_points: None,
        }
    }

    fn ctx(runs: u32) -> RaceContext {
        RaceContext {
            track_profile: TrackProfile::Balanced,
            weather: Weather::Dry,
            tyre_stress: TyreStress::Medium,
            safety_car: SafetyCarLevel::Medium,
            runs,
            randomness: 0.2,
            seed: Some(1),
        }
    }

    fn wait_for_finish(orch: &Orchestrator, id: u64) -> RunStatus {
        for _ in 0..200 {
            if let Some(status) = orch.status(id) {
                if !matches!(status, RunStatus::Running) {
                    return status;
                }
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("run did not finish in time");
    }

    #[test]
    fn submit_runs_to_completion() {
        let orch = Orchestrator::new();
        let drivers = vec![driver("A", 1, 0.0), driver("B", 2, 100.0)];
        let id = orch
            .submit(drivers, ctx(500), vec![], NormalizationPolicy::Linear, Some(7))
            .unwrap();
        let status = wait_for_finish(&orch, id);
        assert_eq!(status, RunStatus::Completed);
        let snapshot = orch.snapshot(id).unwrap();
        assert!(snapshot.result.is_some());
        assert!(!orch.is_busy());
    }

    #[test]
    fn busy_guard_rejects_concurrent_submission() {
        let orch = Orchestrator::new();
        let drivers = vec![driver("A", 1, 0.0), driver("B", 2, 100.0)];
        let _id = orch
            .submit(drivers.clone(), ctx(20_000), vec![], NormalizationPolicy::Linear, Some(1))
            .unwrap();
        let second = orch.submit(drivers, ctx(500), vec![], NormalizationPolicy::Linear, Some(2));
        assert!(matches!(second, Err(SimError::InputValidation(_))));
    }

    #[test]
    fn cancel_marks_run_cancelled() {
        let orch = Orchestrator::new();
        let drivers = vec![driver("A", 1, 0.0), driver("B", 2, 100.0)];
        let id = orch
            .submit(drivers, ctx(20_000), vec![], NormalizationPolicy::Linear, Some(3))
            .unwrap();
        assert!(orch.cancel(id));
        let status = wait_for_finish(&orch, id);
        assert_eq!(status, RunStatus::Cancelled);
    }

    #[test]
    fn history_tracks_completed_runs() {
        let orch = Orchestrator::new();
        for seed in 0..3u32 {
            let drivers = vec![driver("A", 1, 0.0), driver("B", 2, 100.0)];
            let id = orch
                .submit(drivers, ctx(500), vec![], NormalizationPolicy::Linear, Some(seed))
                .unwrap();
            wait_for_finish(&orch, id);
        }
        let history = orch.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].seed, 2);
    }

    #[test]
    fn cooldown_blocks_immediate_refresh() {
        let orch = Orchestrator::with_limits(DEFAULT_TIMEOUT, Duration::from_secs(30));
        assert!(orch.can_refresh_factors());
        orch.mark_factors_refreshed();
        assert!(!orch.can_refresh_factors());
    }
}
