//! Binh-and-Korn, a standard two-objective benchmark: minimise `f1 = 4x^2 + 4y^2` and
//! `f2 = (x-5)^2 + (y-5)^2` over `x in [0, 5]`, `y in [0, 3]`.

use std::sync::Arc;
use std::time::Duration;

use maestro_mo::{
    ContinuousVariable, EnsembleConfig, Generator, GeneticAlgorithm, GeneticAlgorithmConfig, Monitor,
    Objective, ObjectiveKind, Optimizer, OptimizerConfig, PopulationConfig, Problem, Solution, Vicinity,
    VicinityConfig,
};

#[derive(Debug, Clone)]
struct BinhKorn {
    x: f64,
    y: f64,
    f1: f64,
    f2: f64,
    cont: Vec<f64>,
}

impl Solution for BinhKorn {
    fn create_new(_index: usize, _disc_values: &[i64], cont_values: &[f64], _extra: Option<&str>) -> Self {
        let x = cont_values[0];
        let y = cont_values[1];
        Self {
            x,
            y,
            f1: 4.0 * x * x + 4.0 * y * y,
            f2: (x - 5.0).powi(2) + (y - 5.0).powi(2),
            cont: cont_values.to_vec(),
        }
    }

    fn id(&self) -> String {
        format!("({:.4}, {:.4})", self.x, self.y)
    }

    fn disc_values(&self) -> &[i64] {
        &[]
    }

    fn cont_values(&self) -> &[f64] {
        &self.cont
    }

    fn report_header() -> Vec<String> {
        vec!["x".to_string(), "y".to_string()]
    }

    fn report(&self) -> Vec<String> {
        vec![format!("{:.6}", self.x), format!("{:.6}", self.y)]
    }

    fn fitness(&self, obj_index: usize) -> f64 {
        match obj_index {
            0 => self.f1,
            1 => self.f2,
            _ => unreachable!(),
        }
    }
}

struct LoggingMonitor;
impl Monitor for LoggingMonitor {
    fn terminate(&self, reason: &str) {
        log::info!("binh-korn run terminated: {reason}");
    }
}

fn main() -> maestro_mo::Result<()> {
    env_logger::init();

    let problem = Problem::new(
        vec![],
        vec![
            ContinuousVariable::new("x", 0.0, 5.0)?,
            ContinuousVariable::new("y", 0.0, 3.0)?,
        ],
        vec![
            Objective::new(0, "f1", ObjectiveKind::Minimize),
            Objective::new(1, "f2", ObjectiveKind::Minimize),
        ],
    )?;

    let ga = GeneticAlgorithm::new(&problem, GeneticAlgorithmConfig::default())?;
    let vicinity = Vicinity::new(&problem, VicinityConfig::default());
    let generators: Vec<Box<dyn Generator<BinhKorn>>> = vec![Box::new(ga), Box::new(vicinity)];

    let mut optimizer: Optimizer<BinhKorn> = Optimizer::new(
        problem,
        PopulationConfig::default(),
        generators,
        EnsembleConfig::default(),
        OptimizerConfig::default(),
    )?
    .with_monitor(Arc::new(LoggingMonitor))
    .with_all_solutions_log()
    .with_hall_of_fame_log("binh_korn_hall_of_fame.tsv")?;

    let summary = optimizer.start(Duration::from_secs(5), 2_000)?;
    log::info!(
        "finished: {} evaluations, {} in the final front, reason: {}",
        summary.eval_count,
        optimizer.population().first_front_size(),
        summary.termination_reason
    );

    maestro_mo::report::write_report(
        "binh_korn_report.tsv",
        optimizer.problem(),
        optimizer.population(),
        &["ga".to_string(), "vicinity".to_string()],
        &optimizer.generation_history(),
        optimizer.population().config(),
        &OptimizerConfig::default(),
        &summary,
        &optimizer.all_solutions_log(),
    )?;

    maestro_mo::report::Export::build(optimizer.population(), 2, &summary, chrono::Utc::now()).write_json("binh_korn_export.json")?;

    Ok(())
}
