// Cell-list grid for cutoff pair searches.
//
// Space is binned into cells no smaller than the cutoff, so every pair within
// the cutoff lies in the same or an adjacent cell. Wrapping axes get an exact
// integer number of cells spanning the box and the neighbour cells wrap around;
// open axes are unbounded and keyed sparsely. The grid only stores particle
// indices, positions stay with the caller. Rebuilt for every frame.

use itertools::iproduct;
use rustc_hash::FxHashMap;

use crate::geometry::periodic::{Metric, Position};

type CellKey = (i64, i64, i64);

#[derive(Clone, Copy, Debug)]
struct AxisBinning {
    cell_size: f64,
    /// number of cells along a wrapping axis, `None` for open axes
    n_cells: Option<i64>,
}

impl AxisBinning {
    fn new(cutoff: f64, wrap: Option<f64>) -> Self {
        match wrap {
            Some(l) => {
                let n = ((l / cutoff).floor() as i64).max(1);
                AxisBinning { cell_size: l / n as f64, n_cells: Some(n) }
            }
            None => AxisBinning { cell_size: cutoff, n_cells: None },
        }
    }

    #[inline]
    fn bin(&self, x: f64) -> i64 {
        let c = (x / self.cell_size).floor() as i64;
        match self.n_cells {
            Some(n) => c.clamp(0, n - 1),
            // keep c - 1 and c + 1 representable for huge coordinates
            None => c.clamp(i64::MIN + 1, i64::MAX - 1),
        }
    }

    /// Distinct cell indices to scan around cell `c`.
    fn around(&self, c: i64) -> Vec<i64> {
        match self.n_cells {
            Some(n) if n >= 3 => vec![(c - 1).rem_euclid(n), c, (c + 1).rem_euclid(n)],
            Some(n) => (0..n).collect(),
            None => vec![c - 1, c, c + 1],
        }
    }
}

/// Uniform grid over one frame's positions.
pub struct CellGrid {
    axes: [AxisBinning; 3],
    cells: FxHashMap<CellKey, Vec<usize>>,
}

impl CellGrid {
    /// Bins `positions` into cells of edge at least `cutoff`.
    ///
    /// `cutoff` must be positive; callers validate it.
    pub fn build(positions: &[Position], cutoff: f64, metric: &Metric) -> Self {
        debug_assert!(cutoff > 0.0, "cutoff must be positive");
        let axes = [
            AxisBinning::new(cutoff, metric.wrap_length(0)),
            AxisBinning::new(cutoff, metric.wrap_length(1)),
            AxisBinning::new(cutoff, metric.wrap_length(2)),
        ];
        let mut cells: FxHashMap<CellKey, Vec<usize>> = FxHashMap::default();
        let mut grid = CellGrid { axes, cells: FxHashMap::default() };
        for (i, p) in positions.iter().enumerate() {
            cells.entry(grid.cell_of(p, metric)).or_default().push(i);
        }
        grid.cells = cells;
        grid
    }

    #[inline]
    fn cell_of(&self, p: &Position, metric: &Metric) -> CellKey {
        (
            self.axes[0].bin(metric.wrap_coordinate(0, p.x)),
            self.axes[1].bin(metric.wrap_coordinate(1, p.y)),
            self.axes[2].bin(metric.wrap_coordinate(2, p.z)),
        )
    }

    pub fn n_occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Calls `f(i, j)` once for every pair `i < j` with distance strictly below `cutoff`.
    pub fn for_each_pair<F: FnMut(usize, usize)>(
        &self,
        positions: &[Position],
        cutoff: f64,
        metric: &Metric,
        mut f: F,
    ) {
        let cutoff_sq = cutoff * cutoff;
        for (i, p) in positions.iter().enumerate() {
            let (cx, cy, cz) = self.cell_of(p, metric);
            let xs = self.axes[0].around(cx);
            let ys = self.axes[1].around(cy);
            let zs = self.axes[2].around(cz);
            for (gx, gy, gz) in iproduct!(xs.iter(), ys.iter(), zs.iter()) {
                if let Some(members) = self.cells.get(&(*gx, *gy, *gz)) {
                    for &j in members {
                        if j <= i {
                            continue;
                        }
                        if metric.distance_squared(p, &positions[j]) < cutoff_sq {
                            f(i, j);
                        }
                    }
                }
            }
        }
    }
}
