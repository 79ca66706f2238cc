use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::error;
use serde::Serialize;

use crate::core::{DecisionVariable, Objective, Problem, Solution, SolutionHandle};
use crate::ensemble::GenerationHistoryRow;
use crate::error::Result;
use crate::optimizer::{AllSolutionsRow, OptimizerConfig, RunSummary};
use crate::population::{HallOfFameEntry, OfferOutcome, Population, PopulationConfig};

/// Render a solution's decision vector as tab-separated label strings, ordinal discrete values
/// against their configured labels where present, continuous values with six significant digits.
fn decision_fields(disc_values: &[i64], cont_values: &[f64], variables: &[DecisionVariable]) -> Vec<String> {
    let mut fields = Vec::with_capacity(disc_values.len() + cont_values.len());
    let mut d = disc_values.iter();
    let mut c = cont_values.iter();
    for var in variables {
        match var {
            DecisionVariable::Discrete(dv) => {
                if let Some(&value) = d.next() {
                    fields.push(dv.label(value));
                }
            }
            DecisionVariable::Continuous(_) => {
                if let Some(&value) = c.next() {
                    fields.push(format!("{value:.6}"));
                }
            }
        }
    }
    fields
}

fn write_section_header(w: &mut impl Write, title: &str) -> Result<()> {
    writeln!(w)?;
    writeln!(w, "[{title}]")?;
    Ok(())
}

/// Write the full tab-delimited run report to `path`: parameters, registered generators, their
/// per-cycle usage, the final Pareto front, the hall of fame, and (if retained) every solution the
/// optimizer ever offered.
#[allow(clippy::too_many_arguments)]
pub fn write_report<S: Solution + 'static, P: AsRef<Path>>(
    path: P,
    problem: &Problem,
    population: &Population<S>,
    generator_ids: &[String],
    generation_history: &[GenerationHistoryRow],
    population_config: &PopulationConfig,
    optimizer_config: &OptimizerConfig,
    summary: &RunSummary,
    all_solutions_log: &[AllSolutionsRow],
) -> Result<()> {
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    write_section_header(&mut w, "MAESTRO parameters")?;
    writeln!(w, "capacity\t{}", population_config.capacity)?;
    writeln!(w, "allow_equal_performers\t{}", population_config.allow_equal_performers)?;
    writeln!(w, "thread_count\t{}", optimizer_config.thread_count)?;
    writeln!(w, "evaluation_time_limit_ms\t{}", optimizer_config.evaluation_time_limit.as_millis())?;
    writeln!(w, "eval_count\t{}", summary.eval_count)?;
    writeln!(w, "termination_reason\t{}", summary.termination_reason)?;
    writeln!(w, "duration_ms\t{}", summary.duration.as_millis())?;

    write_section_header(&mut w, "Generator methods")?;
    for id in generator_ids {
        writeln!(w, "{id}")?;
    }

    write_section_header(&mut w, "Generator method use")?;
    writeln!(w, "generator_id\tsolutions_generated\ttotal_wall_time_ms\twall_time_per_solution_ms")?;
    for row in generation_history {
        writeln!(
            w,
            "{}\t{}\t{:.3}\t{:.3}",
            row.generator_id,
            row.solutions_generated,
            row.total_wall_time.as_secs_f64() * 1000.0,
            row.wall_time_per_solution_ms()
        )?;
    }

    let variables = problem_variables(problem);

    write_section_header(&mut w, "Pareto front")?;
    write_solution_header(&mut w, problem.objectives(), S::report_header())?;
    population.with_fronts(|fronts| -> Result<()> {
        if let Some(first) = fronts.first() {
            for handle in first.solutions() {
                write_solution_row(&mut w, handle, &variables)?;
            }
        }
        Ok(())
    })?;

    write_section_header(&mut w, "Hall of fame")?;
    writeln!(w, "solution_id\tgenerator\trank_history\treport...\tdecision_values...")?;
    for entry in population.hall_of_fame().snapshot() {
        write_hall_of_fame_row(&mut w, &entry, &variables)?;
    }

    if !all_solutions_log.is_empty() {
        write_section_header(&mut w, "All solutions")?;
        writeln!(w, "solution_id\tgenerator_short_id\toutcome\treport...")?;
        for row in all_solutions_log {
            write_all_solutions_row(&mut w, row)?;
        }
    }

    Ok(())
}

fn problem_variables(problem: &Problem) -> Vec<DecisionVariable> {
    let mut vars: Vec<DecisionVariable> = problem.discrete_vars().iter().cloned().map(DecisionVariable::Discrete).collect();
    vars.extend(problem.continuous_vars().iter().cloned().map(DecisionVariable::Continuous));
    vars
}

fn write_solution_header(w: &mut impl Write, objectives: &[Objective], report_header: Vec<String>) -> Result<()> {
    let mut header = vec!["id".to_string(), "generator".to_string(), "rank_history".to_string()];
    header.extend(objectives.iter().map(|o| o.identifier().to_string()));
    header.extend(report_header);
    writeln!(w, "{}", header.join("\t"))?;
    Ok(())
}

fn write_solution_row<S: Solution>(w: &mut impl Write, handle: &SolutionHandle<S>, variables: &[DecisionVariable]) -> Result<()> {
    let solution = handle.solution();
    let mut fields = vec![
        solution.id(),
        handle.generator_tag().to_string(),
        handle.rank_history_rle(),
    ];
    fields.extend(decision_fields(solution.disc_values(), solution.cont_values(), variables));
    fields.extend(solution.report());
    writeln!(w, "{}", fields.join("\t"))?;
    Ok(())
}

fn write_hall_of_fame_row(w: &mut impl Write, entry: &HallOfFameEntry, variables: &[DecisionVariable]) -> Result<()> {
    let mut fields = vec![entry.id.clone(), entry.generator_tag.to_string(), rle(&entry.rank_history)];
    fields.extend(decision_fields(&entry.disc_values, &entry.cont_values, variables));
    fields.extend(entry.report.clone());
    writeln!(w, "{}", fields.join("\t"))?;
    Ok(())
}

fn offer_outcome_label(outcome: OfferOutcome) -> String {
    match outcome {
        OfferOutcome::Accepted(index) => format!("accepted:{index}"),
        OfferOutcome::RejectedDuplicateValue => "rejected_duplicate_value".to_string(),
        OfferOutcome::RejectedDuplicatePerformance => "rejected_duplicate_performance".to_string(),
    }
}

fn write_all_solutions_row(w: &mut impl Write, row: &AllSolutionsRow) -> Result<()> {
    let mut fields = vec![row.id.clone(), row.generator_tag.to_string(), offer_outcome_label(row.outcome)];
    fields.extend(row.report.clone());
    writeln!(w, "{}", fields.join("\t"))?;
    Ok(())
}

fn variable_names(variables: &[DecisionVariable]) -> Vec<String> {
    variables.iter().map(|v| v.name().to_string()).collect()
}

/// The persistent hall-of-fame log: a tab-delimited, append-only file with header row
/// `solution_id \t generator_short_id \t <user_report_header> \t <disc_var_names> \t <cont_var_names>`,
/// written once when the file is first opened. One row is appended each time a solution attains
/// rank 1 for the first time, via the hook returned by [`HallOfFameLog::into_hook`].
pub struct HallOfFameLog {
    writer: Mutex<BufWriter<File>>,
    variables: Vec<DecisionVariable>,
}

/// Open (or resume) the hall-of-fame log at `path`. The header row is written only if the file
/// did not already exist, so a run can safely append to a log left by a previous one.
pub fn open_hall_of_fame_log<S: Solution, P: AsRef<Path>>(path: P, problem: &Problem) -> Result<HallOfFameLog> {
    let path = path.as_ref();
    let is_new = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    let variables = problem_variables(problem);

    if is_new {
        let mut header = vec!["solution_id".to_string(), "generator_short_id".to_string()];
        header.extend(S::report_header());
        header.extend(variable_names(&variables));
        writeln!(writer, "{}", header.join("\t"))?;
        writer.flush()?;
    }

    Ok(HallOfFameLog {
        writer: Mutex::new(writer),
        variables,
    })
}

impl HallOfFameLog {
    /// Append one row for a solution newly admitted to the hall of fame: id, generator short id,
    /// the user's report fields, then the decision values.
    pub fn append_hall_of_fame_row(&self, entry: &HallOfFameEntry) -> Result<()> {
        let mut fields = vec![entry.id.clone(), entry.generator_tag.to_string()];
        fields.extend(entry.report.clone());
        fields.extend(decision_fields(&entry.disc_values, &entry.cont_values, &self.variables));
        let mut writer = self.writer.lock().unwrap();
        writeln!(writer, "{}", fields.join("\t"))?;
        writer.flush()?;
        Ok(())
    }

    /// Wrap this log as the closure [`crate::population::Population::with_hall_of_fame_logger`]
    /// expects. A write failure is logged and swallowed rather than propagated, since the logger
    /// runs inside the population's merge path and has nowhere to return an error to.
    pub fn into_hook(self: Arc<Self>) -> Arc<dyn Fn(&HallOfFameEntry) + Send + Sync> {
        Arc::new(move |entry: &HallOfFameEntry| {
            if let Err(e) = self.append_hall_of_fame_row(entry) {
                error!("failed to append hall-of-fame log row: {e}");
            }
        })
    }
}

/// A plain, serializable snapshot of one Pareto-front member, independent of the user's
/// [`Solution`] type (which generally cannot implement [`Serialize`] itself).
#[derive(Clone, Debug, Serialize)]
pub struct ExportedSolution {
    pub id: String,
    pub generator: String,
    pub rank_history: Vec<i32>,
    pub disc_values: Vec<i64>,
    pub cont_values: Vec<f64>,
    pub fitness: Vec<f64>,
    pub report: Vec<String>,
}

/// A JSON-serializable export of a finished run's final front and hall of fame, for embeddings
/// that want machine-readable output alongside (or instead of) the tab-delimited report.
#[derive(Clone, Debug, Serialize)]
pub struct Export {
    pub generated_at: DateTime<Utc>,
    pub eval_count: usize,
    pub termination_reason: String,
    pub pareto_front: Vec<ExportedSolution>,
    pub hall_of_fame: Vec<ExportedSolution>,
}

impl Export {
    pub fn build<S: Solution + 'static>(population: &Population<S>, num_objectives: usize, summary: &RunSummary, generated_at: DateTime<Utc>) -> Self {
        let pareto_front = population.with_fronts(|fronts| {
            fronts
                .first()
                .map(|front| front.solutions().iter().map(|h| export_handle(h, num_objectives)).collect())
                .unwrap_or_default()
        });
        let hall_of_fame = population
            .hall_of_fame()
            .snapshot()
            .into_iter()
            .map(|entry| ExportedSolution {
                id: entry.id,
                generator: entry.generator_tag.to_string(),
                rank_history: entry.rank_history,
                disc_values: entry.disc_values,
                cont_values: entry.cont_values,
                fitness: Vec::new(),
                report: entry.report,
            })
            .collect();

        Self {
            generated_at,
            eval_count: summary.eval_count,
            termination_reason: summary.termination_reason.clone(),
            pareto_front,
            hall_of_fame,
        }
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

fn export_handle<S: Solution>(handle: &SolutionHandle<S>, num_objectives: usize) -> ExportedSolution {
    let solution = handle.solution();
    ExportedSolution {
        id: solution.id(),
        generator: handle.generator_tag().to_string(),
        rank_history: handle.rank_history().to_vec(),
        disc_values: solution.disc_values().to_vec(),
        cont_values: solution.cont_values().to_vec(),
        fitness: (0..num_objectives).map(|i| solution.fitness(i)).collect(),
        report: solution.report(),
    }
}

fn rle(ranks: &[i32]) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut iter = ranks.iter().peekable();
    while let Some(&rank) = iter.next() {
        let mut count = 1usize;
        while iter.peek() == Some(&&rank) {
            iter.next();
            count += 1;
        }
        if count == 1 {
            parts.push(rank.to_string());
        } else {
            parts.push(format!("{rank}x{count}"));
        }
    }
    parts.join(", ")
}
