use std::cmp::Ordering;

use crate::core::{Objective, Solution, SolutionHandle};

/// Whether `a` dominates `b`: no worse on every objective, and strictly better on at least one.
fn dominates<S: Solution>(objectives: &[Objective], a: &S, b: &S) -> bool {
    let mut wins = false;
    for objective in objectives {
        match objective.compare(a, b) {
            Ordering::Less => wins = true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
    }
    wins
}

/// Sort `handles` into Pareto fronts, O(n^2 * m) where m is the number of objectives.
///
/// Implements the fast non-dominated sort from the NSGA-II paper (Deb et al., 2002, section 3A):
/// every pair is compared once, non-dominated solutions form front 1, and subsequent fronts are
/// derived by decrementing domination counters. Returns the indices (into `handles`) belonging to
/// each front, in rank order; `handles[i].children`/`domination_count` are left populated for the
/// front each solution ended up in (transient sort state, not meant to be read afterwards).
///
/// `cap`, if given, stops deriving further fronts once the accumulated front sizes reach it;
/// `cap == Some(0)` still computes the full first front (there is no way to produce zero fronts
/// for a non-empty input) but stops immediately afterwards.
pub fn fast_non_dominated_sort<S: Solution>(
    handles: &mut [SolutionHandle<S>],
    objectives: &[Objective],
    cap: Option<usize>,
) -> Vec<Vec<usize>> {
    let n = handles.len();
    if n == 0 {
        return Vec::new();
    }

    for h in handles.iter_mut() {
        h.domination_count = 0;
        h.children.clear();
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(objectives, handles[i].solution(), handles[j].solution()) {
                handles[i].children.push(j);
                handles[j].domination_count += 1;
            } else if dominates(objectives, handles[j].solution(), handles[i].solution()) {
                handles[j].children.push(i);
                handles[i].domination_count += 1;
            }
        }
    }

    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| handles[i].domination_count == 0).collect();
    let mut accumulated = 0usize;

    loop {
        accumulated += current.len();
        let this_front = std::mem::take(&mut current);
        let mut counts: Vec<usize> = handles.iter().map(|h| h.domination_count).collect();

        if let Some(cap) = cap {
            if accumulated >= cap {
                fronts.push(this_front);
                break;
            }
        }

        let mut next: Vec<usize> = Vec::new();
        for &p in &this_front {
            for &q in &handles[p].children {
                counts[q] -= 1;
                if counts[q] == 0 {
                    next.push(q);
                }
            }
        }
        for (i, c) in counts.iter().enumerate() {
            handles[i].domination_count = *c;
        }

        fronts.push(this_front);
        if next.is_empty() {
            break;
        }
        current = next;
    }

    fronts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GeneratorTag, ObjectiveKind};

    #[derive(Debug, Clone)]
    struct Pt(f64, f64);
    impl Solution for Pt {
        fn create_new(_i: usize, _d: &[i64], _c: &[f64], _e: Option<&str>) -> Self {
            unreachable!()
        }
        fn id(&self) -> String {
            "pt".to_string()
        }
        fn disc_values(&self) -> &[i64] {
            &[]
        }
        fn cont_values(&self) -> &[f64] {
            &[]
        }
        fn fitness(&self, obj_index: usize) -> f64 {
            if obj_index == 0 {
                self.0
            } else {
                self.1
            }
        }
    }

    fn handles_of(points: &[(f64, f64)]) -> Vec<SolutionHandle<Pt>> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| SolutionHandle::new(i, GeneratorTag::Random, Pt(x, y)))
            .collect()
    }

    fn min_objectives() -> Vec<Objective> {
        vec![
            Objective::new(0, "f1", ObjectiveKind::Minimize),
            Objective::new(1, "f2", ObjectiveKind::Minimize),
        ]
    }

    #[test]
    fn sorts_2obj_into_known_fronts() {
        let points = [
            (1.1, 8.1),
            (2.1, 6.1),
            (3.1, 4.1),
            (3.1, 7.1),
            (5.1, 3.1),
            (5.1, 5.1),
            (7.1, 7.1),
            (8.1, 2.1),
            (10.1, 6.1),
            (11.1, 1.1),
            (11.1, 3.1),
        ];
        let mut handles = handles_of(&points);
        let objectives = min_objectives();
        let fronts = fast_non_dominated_sort(&mut handles, &objectives, None);

        assert_eq!(fronts[0], vec![0, 1, 2, 4, 7, 9]);
        assert_eq!(fronts[1], vec![3, 5, 10]);
        assert_eq!(fronts[2], vec![6, 8]);
    }

    #[test]
    fn no_solution_in_later_front_dominates_earlier_front() {
        let points = [
            (1.0, 5.0),
            (2.0, 3.0),
            (4.0, 4.0),
            (3.0, 3.5),
            (0.5, 9.0),
            (6.0, 1.0),
        ];
        let mut handles = handles_of(&points);
        let objectives = min_objectives();
        let fronts = fast_non_dominated_sort(&mut handles, &objectives, None);

        for (i, front_i) in fronts.iter().enumerate() {
            for front_j in fronts.iter().skip(i + 1) {
                for &a in front_i {
                    for &b in front_j {
                        assert!(!dominates(&objectives, handles[b].solution(), handles[a].solution()));
                    }
                }
            }
        }
    }

    #[test]
    fn cap_zero_still_returns_full_first_front() {
        let points = [(1.0, 5.0), (2.0, 3.0), (0.5, 9.0)];
        let mut handles = handles_of(&points);
        let objectives = min_objectives();
        let fronts = fast_non_dominated_sort(&mut handles, &objectives, Some(0));
        assert_eq!(fronts.len(), 1);
        assert!(!fronts[0].is_empty());
    }

    #[test]
    fn cap_minus_one_equivalent_sorts_everything() {
        let points = [
            (1.0, 5.0),
            (2.0, 3.0),
            (4.0, 4.0),
            (3.0, 3.5),
            (0.5, 9.0),
            (6.0, 1.0),
        ];
        let mut handles = handles_of(&points);
        let objectives = min_objectives();
        let fronts = fast_non_dominated_sort(&mut handles, &objectives, None);
        let total: usize = fronts.iter().map(|f| f.len()).sum();
        assert_eq!(total, points.len());
    }
}
