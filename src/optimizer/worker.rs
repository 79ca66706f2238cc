use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::core::{GeneratorTag, Solution};
use crate::ensemble::{Ensemble, GenerationHistoryRow};
use crate::optimizer::monitor::Monitor;
use crate::optimizer::AllSolutionsRow;
use crate::population::Population;

/// The shared generation buffer: a bounded-in-practice queue plus a condvar, guarding both queue
/// operations and refill so a refill's contents are visible under the same lock that checked the
/// queue was running low.
pub(crate) struct GenerationBuffer {
    pub(crate) queue: Mutex<VecDeque<crate::core::SolutionRoot>>,
    pub(crate) condvar: std::sync::Condvar,
}

impl GenerationBuffer {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: std::sync::Condvar::new(),
        }
    }
}

/// Fires the termination callback exactly once, whichever trigger reaches it first.
pub(crate) struct TerminationLatch {
    fired: AtomicBool,
    reason: Mutex<Option<String>>,
    monitor: Arc<dyn Monitor>,
}

impl TerminationLatch {
    pub(crate) fn new(monitor: Arc<dyn Monitor>) -> Self {
        Self {
            fired: AtomicBool::new(false),
            reason: Mutex::new(None),
            monitor,
        }
    }

    pub(crate) fn fire(&self, terminate_flag: &AtomicBool, reason: impl Into<String>) {
        terminate_flag.store(true, Ordering::SeqCst);
        if !self.fired.swap(true, Ordering::SeqCst) {
            let reason = reason.into();
            debug!("optimizer terminating: {reason}");
            *self.reason.lock().unwrap() = Some(reason.clone());
            self.monitor.terminate(&reason);
        }
    }

    pub(crate) fn reason(&self) -> Option<String> {
        self.reason.lock().unwrap().clone()
    }
}

pub(crate) struct WorkerContext<S: Solution + 'static> {
    pub(crate) population: Population<S>,
    pub(crate) buffer: Arc<GenerationBuffer>,
    pub(crate) ensemble: Arc<Ensemble<S>>,
    pub(crate) terminate: Arc<AtomicBool>,
    pub(crate) eval_count: Arc<AtomicUsize>,
    pub(crate) next_eval_id: Arc<AtomicUsize>,
    pub(crate) evaluation_time_limit: Duration,
    pub(crate) start_time: Instant,
    pub(crate) time_limit: Duration,
    pub(crate) solution_limit: usize,
    pub(crate) thread_count: usize,
    pub(crate) active_workers: Arc<AtomicUsize>,
    pub(crate) generation_history: Arc<Mutex<Vec<GenerationHistoryRow>>>,
    pub(crate) all_solutions_log: Option<Arc<Mutex<Vec<AllSolutionsRow>>>>,
    pub(crate) termination: Arc<TerminationLatch>,
}

struct ActiveWorkerGuard(Arc<AtomicUsize>);
impl Drop for ActiveWorkerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Pull the next root from the buffer, refilling it from the ensemble (under the buffer mutex)
/// when it runs low. Returns `None` if there is nothing to do right now and the caller should back
/// off briefly rather than busy-poll.
fn pull_or_refill<S: Solution + 'static>(ctx: &WorkerContext<S>) -> Option<crate::core::SolutionRoot> {
    let mut queue = ctx.buffer.queue.lock().unwrap();
    loop {
        if let Some(root) = queue.pop_front() {
            return Some(root);
        }
        if ctx.terminate.load(Ordering::SeqCst) {
            return None;
        }
        if queue.len() < ctx.thread_count {
            let (roots, history) = ctx.ensemble.generate(&ctx.population);
            if !history.is_empty() {
                ctx.generation_history.lock().unwrap().extend(history);
            }
            if roots.is_empty() {
                return None;
            }
            queue.extend(roots);
            ctx.buffer.condvar.notify_all();
            continue;
        }
        let (q, _) = ctx
            .buffer
            .condvar
            .wait_timeout(queue, Duration::from_millis(20))
            .unwrap();
        queue = q;
    }
}

/// One worker's main loop. On an evaluation timeout the worker abandons the stuck call, spawns a
/// replacement in its place, and exits; the abandoned evaluation keeps running on its own detached
/// thread but its result is simply dropped when it eventually completes.
pub(crate) fn run_worker<S: Solution + 'static>(ctx: Arc<WorkerContext<S>>) {
    ctx.active_workers.fetch_add(1, Ordering::SeqCst);
    let _guard = ActiveWorkerGuard(Arc::clone(&ctx.active_workers));

    loop {
        if ctx.terminate.load(Ordering::SeqCst) {
            return;
        }

        let root = match pull_or_refill(&ctx) {
            Some(root) => root,
            None => {
                thread::sleep(Duration::from_millis(5));
                continue;
            }
        };

        let eval_id = ctx.next_eval_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel();
        let disc = root.disc_values.clone();
        let cont = root.cont_values.clone();
        let extra = root.extra.clone();
        thread::spawn(move || {
            let solution = S::create_new(eval_id, &disc, &cont, extra.as_deref());
            let _ = tx.send(solution);
        });

        match rx.recv_timeout(ctx.evaluation_time_limit) {
            Ok(solution) => handle_evaluated(&ctx, root.generator_tag, solution),
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "evaluation of solution {eval_id} exceeded the {:?} time limit; replacing this worker",
                    ctx.evaluation_time_limit
                );
                let replacement = Arc::clone(&ctx);
                thread::spawn(move || run_worker(replacement));
                return;
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("evaluator for solution {eval_id} panicked; solution discarded");
            }
        }

        if ctx.start_time.elapsed() >= ctx.time_limit {
            ctx.termination
                .fire(&ctx.terminate, format!("reached the {:?} time limit", ctx.time_limit));
        }
    }
}

fn handle_evaluated<S: Solution + 'static>(ctx: &WorkerContext<S>, generator_tag: GeneratorTag, solution: S) {
    if !solution.valid() {
        debug!("discarding invalid solution, not counted toward the solution limit");
        return;
    }
    let converged = solution.converged();
    let id = solution.id();
    let report = if ctx.all_solutions_log.is_some() { solution.report() } else { Vec::new() };

    let outcome = ctx.population.offer(solution, generator_tag.clone());
    if let Some(log) = &ctx.all_solutions_log {
        log.lock().unwrap().push(AllSolutionsRow {
            id,
            generator_tag,
            outcome,
            report,
        });
    }

    let n = ctx.eval_count.fetch_add(1, Ordering::SeqCst) + 1;

    if converged {
        ctx.termination
            .fire(&ctx.terminate, "a solution reported converged() == true");
    }
    if n >= ctx.solution_limit {
        ctx.termination
            .fire(&ctx.terminate, format!("reached the solution_limit of {}", ctx.solution_limit));
    }
}
