use std::cmp::Ordering;

use rand::Rng;

use crate::core::{Objective, ObjectiveKind, Solution, SolutionHandle};

/// A set of mutually non-dominated solutions under the current objective set, plus a scalar
/// weight used during rank-weighted selection (see [`crate::population::Population::select`]).
#[derive(Debug)]
pub struct Front<S> {
    handles: Vec<SolutionHandle<S>>,
    weight: f64,
}

impl<S> Default for Front<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Front<S> {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            weight: 0.0,
        }
    }

    pub fn from_handles(handles: Vec<SolutionHandle<S>>) -> Self {
        Self { handles, weight: 0.0 }
    }

    pub fn add(&mut self, handle: SolutionHandle<S>) {
        self.handles.push(handle);
    }

    pub fn add_all(&mut self, other: Front<S>) {
        self.handles.extend(other.handles);
    }

    pub fn contains(&self, index: usize) -> bool {
        self.handles.iter().any(|h| h.index() == index)
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn solutions(&self) -> &[SolutionHandle<S>] {
        &self.handles
    }

    pub fn solutions_mut(&mut self) -> &mut [SolutionHandle<S>] {
        &mut self.handles
    }

    pub fn into_handles(self) -> Vec<SolutionHandle<S>> {
        self.handles
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}

impl<S: Solution> Front<S> {
    /// Reduce this front to exactly `count` members via NSGA-II crowding-distance: for each
    /// objective, sort by that objective, give the two endpoints infinite temporary distance, and
    /// accumulate normalized interior gaps into each solution's overall crowding distance. Then
    /// keep the `count` solutions with the largest overall distance.
    ///
    /// Ties are broken by ascending handle index by default (deterministic under a seeded RNG);
    /// set `coin_flip_tie_break` to restore the original random-symmetric tie-break, kept only for
    /// parity testing against the Java original.
    pub fn reduced(
        self,
        count: usize,
        objectives: &[Objective],
        coin_flip_tie_break: bool,
        rng: &mut impl Rng,
    ) -> Front<S> {
        let (kept, _discarded) = self.reduced_split(count, objectives, coin_flip_tie_break, rng);
        kept
    }

    /// As [`Front::reduced`], but also returns the handles that were crowded out instead of
    /// dropping them, so callers can record their eviction (rank history, hall-of-fame sync).
    pub fn reduced_split(
        mut self,
        count: usize,
        objectives: &[Objective],
        coin_flip_tie_break: bool,
        rng: &mut impl Rng,
    ) -> (Front<S>, Vec<SolutionHandle<S>>) {
        if count >= self.handles.len() {
            return (self, Vec::new());
        }

        for h in self.handles.iter_mut() {
            h.crowding_distance = 0.0;
        }
        for objective in objectives {
            Self::accumulate_crowding(&mut self.handles, objective);
        }

        self.handles.sort_by(|a, b| {
            match b
                .crowding_distance
                .partial_cmp(&a.crowding_distance)
                .unwrap_or(Ordering::Equal)
            {
                Ordering::Equal => {
                    if coin_flip_tie_break {
                        if rng.gen_bool(0.5) {
                            Ordering::Less
                        } else {
                            Ordering::Greater
                        }
                    } else {
                        a.index().cmp(&b.index())
                    }
                }
                other => other,
            }
        });
        let discarded = self.handles.split_off(count);
        (self, discarded)
    }

    /// One crowding-distance pass for a single objective, accumulating into each handle's
    /// `crowding_distance` field.
    fn accumulate_crowding(handles: &mut [SolutionHandle<S>], objective: &Objective) {
        let n = handles.len();
        if n == 0 {
            return;
        }
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| objective.compare(handles[a].solution(), handles[b].solution()));

        if n == 1 {
            handles[order[0]].crowding_distance = f64::INFINITY;
            return;
        }

        handles[order[0]].crowding_distance = f64::INFINITY;
        handles[order[n - 1]].crowding_distance = f64::INFINITY;
        if n == 2 {
            return;
        }

        let mut temp = vec![0.0_f64; n];
        let mut max_gap = 0.0_f64;
        for k in 1..n - 1 {
            let prev = order[k - 1];
            let next = order[k + 1];
            let d = match objective.kind() {
                ObjectiveKind::Custom => {
                    if handles[prev]
                        .solution()
                        .compare_to(objective.index(), handles[next].solution())
                        != Ordering::Equal
                    {
                        1.0
                    } else {
                        0.0
                    }
                }
                _ => {
                    let a = handles[next].solution().fitness(objective.index());
                    let b = handles[prev].solution().fitness(objective.index());
                    (a - b).abs()
                }
            };
            temp[k] = d;
            if d > max_gap {
                max_gap = d;
            }
        }
        for k in 1..n - 1 {
            let normalized = if max_gap > 0.0 { temp[k] / max_gap } else { 0.0 };
            handles[order[k]].crowding_distance += normalized;
        }
    }
}
