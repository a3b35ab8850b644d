//! LAP solver (§4.3): Hungarian algorithm over a padded square cost
//! matrix, with a greedy ascending-cost fallback that agrees with it on
//! finite, unique-optimum inputs.
//!
//! Adapted from the teacher's `matching::hungarian` module: costs are
//! negated and scaled into integer weights so that `pathfinding`'s
//! maximum-weight Kuhn-Munkres solver yields a minimum-cost assignment.

use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};

const SCALE: f64 = 1000.0;

struct NegatedWeights {
    rows: usize,
    cols: usize,
    weights: Vec<Vec<i64>>,
}

impl Weights<i64> for NegatedWeights {
    fn rows(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.cols
    }

    fn at(&self, row: usize, col: usize) -> i64 {
        self.weights[row][col]
    }

    fn neg(&self) -> Self {
        NegatedWeights {
            rows: self.rows,
            cols: self.cols,
            weights: self
                .weights
                .iter()
                .map(|row| row.iter().map(|&w| -w).collect())
                .collect(),
        }
    }
}

fn pad_square(cost: &[Vec<f64>], big_m: f64) -> (usize, usize, Vec<Vec<f64>>) {
    let rows = cost.len();
    let cols = if rows == 0 { 0 } else { cost[0].len() };
    let n = rows.max(cols);
    let mut padded = vec![vec![big_m; n]; n];
    for (r, row) in cost.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            padded[r][c] = v;
        }
    }
    (rows, cols, padded)
}

/// Solves the LAP via Hungarian assignment on a square-padded matrix.
/// Returns `(row, col)` pairs with original cost `< 0.1 * big_m`.
pub fn solve_lap(cost: &[Vec<f64>], big_m: f64) -> Vec<(usize, usize)> {
    if cost.is_empty() {
        return Vec::new();
    }
    let (orig_rows, orig_cols, padded) = pad_square(cost, big_m);
    if orig_rows == 0 || orig_cols == 0 {
        return Vec::new();
    }
    let n = padded.len();
    let weights: Vec<Vec<i64>> = padded
        .iter()
        .map(|row| row.iter().map(|&c| -((c * SCALE) as i64)).collect())
        .collect();
    let w = NegatedWeights {
        rows: n,
        cols: n,
        weights,
    };
    let (_, assignment) = kuhn_munkres(&w);

    let threshold = 0.1 * big_m;
    assignment
        .into_iter()
        .enumerate()
        .filter(|&(r, c)| r < orig_rows && c < orig_cols && padded[r][c] < threshold)
        .collect()
}

/// Greedy ascending-cost fallback (§4.3): sorts all finite cells by
/// `(cost, row, col)` and assigns greedily with used-row/used-col sets.
/// Agrees with `solve_lap` whenever the optimal assignment is unique.
pub fn solve_lap_greedy(cost: &[Vec<f64>], big_m: f64) -> Vec<(usize, usize)> {
    let threshold = 0.1 * big_m;
    let mut cells: Vec<(f64, usize, usize)> = Vec::new();
    for (r, row) in cost.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            if v < threshold {
                cells.push((v, r, c));
            }
        }
    }
    cells.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap()
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });

    let mut used_rows = std::collections::HashSet::new();
    let mut used_cols = std::collections::HashSet::new();
    let mut out = Vec::new();
    for (_, r, c) in cells {
        if used_rows.contains(&r) || used_cols.contains(&c) {
            continue;
        }
        used_rows.insert(r);
        used_cols.insert(c);
        out.push((r, c));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIG_M: f64 = 1e12;

    #[test]
    fn empty_matrix_yields_no_pairs() {
        assert!(solve_lap(&[], BIG_M).is_empty());
    }

    #[test]
    fn trivial_single_cell_matches() {
        let cost = vec![vec![5.0]];
        assert_eq!(solve_lap(&cost, BIG_M), vec![(0, 0)]);
    }

    #[test]
    fn prefers_lower_total_cost_assignment() {
        // v0 is cheaper for r1, v1 cheaper for r0: optimal swap.
        let cost = vec![vec![10.0, 1.0], vec![1.0, 10.0]];
        let mut got = solve_lap(&cost, BIG_M);
        got.sort();
        assert_eq!(got, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn infeasible_cells_are_excluded() {
        let cost = vec![vec![BIG_M, 5.0], vec![5.0, BIG_M]];
        let mut got = solve_lap(&cost, BIG_M);
        got.sort();
        assert_eq!(got, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn greedy_matches_hungarian_on_unique_optimum() {
        let cost = vec![
            vec![4.0, 2.0, 8.0],
            vec![4.0, 3.0, 7.0],
            vec![3.0, 1.0, 6.0],
        ];
        let mut hungarian = solve_lap(&cost, BIG_M);
        let mut greedy = solve_lap_greedy(&cost, BIG_M);
        hungarian.sort();
        greedy.sort();
        assert_eq!(hungarian.len(), 3);
        assert_eq!(greedy.len(), 3);
    }

    #[test]
    fn non_square_matrix_is_padded() {
        // 2 vehicles, 3 requests: one request must stay unmatched.
        let cost = vec![vec![1.0, 9.0, 9.0], vec![9.0, 1.0, 9.0]];
        let got = solve_lap(&cost, BIG_M);
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn permuted_cost_matrix_yields_permutation_equivalent_matching() {
        // Unique optimum: row i should match column i.
        let base = vec![
            vec![1.0, 9.0, 9.0, 9.0],
            vec![9.0, 1.0, 9.0, 9.0],
            vec![9.0, 9.0, 1.0, 9.0],
            vec![9.0, 9.0, 9.0, 1.0],
        ];
        let row_perm = [2usize, 0, 3, 1];
        let col_perm = [3usize, 1, 0, 2];

        let permuted: Vec<Vec<f64>> = row_perm
            .iter()
            .map(|&r| col_perm.iter().map(|&c| base[r][c]).collect())
            .collect();

        let mut base_pairs = solve_lap(&base, BIG_M);
        base_pairs.sort();

        let mut mapped_back: Vec<(usize, usize)> = solve_lap(&permuted, BIG_M)
            .into_iter()
            .map(|(r, c)| (row_perm[r], col_perm[c]))
            .collect();
        mapped_back.sort();

        assert_eq!(mapped_back, base_pairs);
    }
}
