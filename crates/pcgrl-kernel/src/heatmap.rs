//! Heatmap of successful edits over the current episode.

use ndarray::Array2;

/// Dense `height × width` edit counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    counts: Array2<f64>,
}

impl Heatmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            counts: Array2::zeros((height, width)),
        }
    }

    /// Zero every counter, resizing first if the grid dimensions changed.
    pub fn reset(&mut self, width: usize, height: usize) {
        if self.counts.dim() == (height, width) {
            self.counts.fill(0.0);
        } else {
            self.counts = Array2::zeros((height, width));
        }
    }

    /// Count one edit at column `x`, row `y`.
    ///
    /// Coordinates outside the grid are ignored and reported as `false`.
    pub fn record(&mut self, x: usize, y: usize) -> bool {
        match self.counts.get_mut((y, x)) {
            Some(cell) => {
                *cell += 1.0;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.counts.get((y, x)).copied()
    }

    pub fn width(&self) -> usize {
        self.counts.ncols()
    }

    pub fn height(&self) -> usize {
        self.counts.nrows()
    }

    /// Sum of all counters, i.e. the number of edits recorded this episode.
    pub fn total(&self) -> f64 {
        self.counts.sum()
    }

    pub fn view(&self) -> &Array2<f64> {
        &self.counts
    }

    /// Owned copy, as handed out inside observations.
    pub fn snapshot(&self) -> Array2<f64> {
        self.counts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed_with_grid_shape() {
        let heatmap = Heatmap::new(5, 3);
        assert_eq!(heatmap.width(), 5);
        assert_eq!(heatmap.height(), 3);
        assert_eq!(heatmap.view().dim(), (3, 5));
        assert_eq!(heatmap.total(), 0.0);
    }

    #[test]
    fn test_record_increments_by_one() {
        let mut heatmap = Heatmap::new(4, 4);
        assert!(heatmap.record(1, 2));
        assert!(heatmap.record(1, 2));
        assert!(heatmap.record(3, 0));

        assert_eq!(heatmap.get(1, 2), Some(2.0));
        assert_eq!(heatmap.get(3, 0), Some(1.0));
        assert_eq!(heatmap.get(0, 0), Some(0.0));
        assert_eq!(heatmap.view()[[2, 1]], 2.0);
        assert_eq!(heatmap.total(), 3.0);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut heatmap = Heatmap::new(2, 2);
        assert!(!heatmap.record(2, 0));
        assert!(!heatmap.record(0, 5));
        assert_eq!(heatmap.total(), 0.0);
    }

    #[test]
    fn test_reset_zeroes_and_resizes() {
        let mut heatmap = Heatmap::new(3, 3);
        heatmap.record(1, 1);
        heatmap.reset(3, 3);
        assert_eq!(heatmap.total(), 0.0);

        heatmap.reset(6, 2);
        assert_eq!(heatmap.view().dim(), (2, 6));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut heatmap = Heatmap::new(2, 2);
        let before = heatmap.snapshot();
        heatmap.record(0, 0);
        assert_eq!(before[[0, 0]], 0.0);
        assert_eq!(heatmap.view()[[0, 0]], 1.0);
    }
}
