use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::{GeneratorTag, Problem, Solution, SolutionRoot};
use crate::ensemble::{Ensemble, EnsembleConfig, GenerationHistoryRow};
use crate::error::{MaestroError, Result};
use crate::generators::Generator;
use crate::optimizer::monitor::{Monitor, NullMonitor};
use crate::optimizer::worker::{run_worker, GenerationBuffer, TerminationLatch, WorkerContext};
use crate::population::{OfferOutcome, Population, PopulationConfig};
use crate::report;

/// How long [`Optimizer::start`] waits, past the termination trigger, for in-flight workers to
/// notice the flag and exit before forcing a final population update anyway.
pub const MAX_SHUTDOWN_WAIT: Duration = Duration::from_millis(2_000);

/// Tunables for [`Optimizer`] that are not already owned by [`PopulationConfig`] or
/// [`EnsembleConfig`].
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    /// Number of concurrent worker threads evaluating candidates.
    pub thread_count: usize,
    /// Per-evaluation wall-clock budget; an evaluator that overruns this is abandoned.
    pub evaluation_time_limit: Duration,
    /// Fraction of capacity to seed with uniformly random roots at start-up (on top of any
    /// user-predefined roots).
    pub random_solution_ratio: f64,
    /// Whether to retain a full log of every offered solution (accepted or rejected) for the
    /// `[All solutions]` report section.
    pub retain_all_solutions_log: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            thread_count: 4,
            evaluation_time_limit: Duration::from_secs(30),
            random_solution_ratio: 1.0,
            retain_all_solutions_log: false,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.thread_count == 0 {
            return Err(MaestroError::InvalidConfiguration(
                "thread_count".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.random_solution_ratio) {
            return Err(MaestroError::InvalidConfiguration(
                "random_solution_ratio".to_string(),
                "must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// One row of the retained all-solutions log (see [`OptimizerConfig::retain_all_solutions_log`]).
#[derive(Clone, Debug)]
pub struct AllSolutionsRow {
    pub id: String,
    pub generator_tag: GeneratorTag,
    pub outcome: OfferOutcome,
    pub report: Vec<String>,
}

/// Summary returned by [`Optimizer::start`] once the run has terminated.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub eval_count: usize,
    pub termination_reason: String,
    pub duration: Duration,
}

/// Orchestrates a single optimization run: seeds the initial buffer, drives a pool of worker
/// threads that pull candidates, evaluate them, and offer results to the [`Population`], and
/// stops once any of the three termination triggers fires.
pub struct Optimizer<S: Solution> {
    problem: Arc<Problem>,
    population: Population<S>,
    ensemble: Arc<Ensemble<S>>,
    monitor: Arc<dyn Monitor>,
    config: OptimizerConfig,
    predefined_roots: Vec<SolutionRoot>,
    all_solutions_log: Option<Arc<Mutex<Vec<AllSolutionsRow>>>>,
    generation_history: Arc<Mutex<Vec<GenerationHistoryRow>>>,
}

impl<S: Solution + 'static> Optimizer<S> {
    pub fn new(
        problem: Problem,
        population_config: PopulationConfig,
        generators: Vec<Box<dyn Generator<S>>>,
        ensemble_config: EnsembleConfig,
        config: OptimizerConfig,
    ) -> Result<Self> {
        population_config.validate()?;
        config.validate()?;
        let capacity = population_config.capacity;
        let population = Population::new(problem.objectives().to_vec(), population_config);
        let ensemble = Ensemble::new(generators, ensemble_config, capacity);
        Ok(Self {
            problem: Arc::new(problem),
            population,
            ensemble: Arc::new(ensemble),
            monitor: Arc::new(NullMonitor),
            config,
            predefined_roots: Vec::new(),
            all_solutions_log: None,
            generation_history: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn Monitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_predefined_roots(mut self, roots: Vec<SolutionRoot>) -> Self {
        self.predefined_roots = roots;
        self
    }

    pub fn with_all_solutions_log(mut self) -> Self {
        self.all_solutions_log = Some(Arc::new(Mutex::new(Vec::new())));
        self
    }

    /// Attach the persistent hall-of-fame log at `path`: one tab-delimited row is appended each
    /// time a solution first attains rank 1 (see [`crate::report::open_hall_of_fame_log`]).
    pub fn with_hall_of_fame_log<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let log = Arc::new(report::open_hall_of_fame_log::<S, _>(path, &self.problem)?);
        self.population = self.population.with_hall_of_fame_logger(log.into_hook());
        Ok(self)
    }

    pub fn population(&self) -> &Population<S> {
        &self.population
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn generation_history(&self) -> Vec<GenerationHistoryRow> {
        self.generation_history.lock().unwrap().clone()
    }

    pub fn all_solutions_log(&self) -> Vec<AllSolutionsRow> {
        self.all_solutions_log
            .as_ref()
            .map(|log| log.lock().unwrap().clone())
            .unwrap_or_default()
    }

    /// Run the optimization until it terminates, either by wall-clock time, by `solution_limit`
    /// valid solutions having been evaluated, or by a solution reporting [`Solution::converged`].
    pub fn start(&mut self, time_limit: Duration, solution_limit: usize) -> Result<RunSummary> {
        self.monitor.reset();

        let capacity = self.population.config().capacity;
        let predefined = std::mem::take(&mut self.predefined_roots);
        let buffer = Arc::new(GenerationBuffer::new());
        {
            let mut queue = buffer.queue.lock().unwrap();
            for root in predefined {
                queue.push_back(root);
            }
            let already = queue.len();
            let target = ((capacity.saturating_sub(already)) as f64)
                .max(self.config.random_solution_ratio * capacity as f64)
                .ceil() as usize;
            let mut rng = ChaCha8Rng::from_entropy();
            for _ in 0..target {
                queue.push_back(self.problem.sample_root(&mut rng, GeneratorTag::Random));
            }
            info!("optimizer start: seeded {} candidates ({} predefined)", queue.len(), already);
        }

        let terminate = Arc::new(AtomicBool::new(false));
        let eval_count = Arc::new(AtomicUsize::new(0));
        let next_eval_id = Arc::new(AtomicUsize::new(0));
        let active_workers = Arc::new(AtomicUsize::new(0));
        let termination = Arc::new(TerminationLatch::new(Arc::clone(&self.monitor)));
        let start_time = Instant::now();

        let ctx = Arc::new(WorkerContext {
            population: self.population.clone(),
            buffer: Arc::clone(&buffer),
            ensemble: Arc::clone(&self.ensemble),
            terminate: Arc::clone(&terminate),
            eval_count: Arc::clone(&eval_count),
            next_eval_id,
            evaluation_time_limit: self.config.evaluation_time_limit,
            start_time,
            time_limit,
            solution_limit,
            thread_count: self.config.thread_count,
            active_workers: Arc::clone(&active_workers),
            generation_history: Arc::clone(&self.generation_history),
            all_solutions_log: self.all_solutions_log.clone(),
            termination: Arc::clone(&termination),
        });

        for _ in 0..self.config.thread_count {
            let worker_ctx = Arc::clone(&ctx);
            thread::spawn(move || run_worker(worker_ctx));
        }

        while !terminate.load(Ordering::SeqCst) {
            if start_time.elapsed() >= time_limit {
                termination.fire(&terminate, format!("reached the {time_limit:?} time limit"));
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }

        let shutdown_start = Instant::now();
        while active_workers.load(Ordering::SeqCst) > 0 && shutdown_start.elapsed() < MAX_SHUTDOWN_WAIT {
            thread::sleep(Duration::from_millis(10));
        }

        self.population.merge();

        if !terminate.load(Ordering::SeqCst) {
            termination.fire(&terminate, "optimizer shut down");
        }

        Ok(RunSummary {
            eval_count: eval_count.load(Ordering::SeqCst),
            termination_reason: termination.reason().unwrap_or_else(|| "unknown".to_string()),
            duration: start_time.elapsed(),
        })
    }
}
