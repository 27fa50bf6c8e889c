use tracing::trace;

/// Step multipliers tried at every power of ten
const MULTIPLIERS: [u32; 3] = [1, 2, 5];

/// Chooses round tick values (1, 2 or 5 times a power of ten) inside a range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickPlanner {
    min_count: usize,
    max_count: usize,
    target: usize,
}

impl Default for TickPlanner {
    fn default() -> Self {
        Self {
            min_count: 3,
            max_count: 8,
            target: 5,
        }
    }
}

/// A candidate step `mult * 10^exp`
#[derive(Clone, Copy, Debug)]
struct Step {
    mult: u32,
    exp: i32,
}

impl Step {
    fn size(&self) -> f64 {
        self.mult as f64 * 10f64.powi(self.exp)
    }

    /// `i * step`, computed so that 0.1-style steps come out clean
    fn value(&self, i: i64) -> f64 {
        if self.exp >= 0 {
            (i * self.mult as i64) as f64 * 10f64.powi(self.exp)
        } else {
            (i * self.mult as i64) as f64 / 10f64.powi(-self.exp)
        }
    }

    fn index_range(&self, min: f64, max: f64) -> (i64, i64) {
        let size = self.size();
        ((min / size).ceil() as i64, (max / size).floor() as i64)
    }

    /// Number of multiples in [min, max], without building them
    fn count(&self, min: f64, max: f64) -> usize {
        let (first, last) = self.index_range(min, max);
        (first..=last)
            .filter(|&i| {
                let v = self.value(i);
                v >= min && v <= max
            })
            .count()
    }

    /// All multiples of the step inside [min, max]
    fn ticks(&self, min: f64, max: f64) -> Vec<f64> {
        let (first, last) = self.index_range(min, max);
        (first..=last)
            .map(|i| self.value(i))
            .filter(|v| *v >= min && *v <= max)
            .collect()
    }
}

impl TickPlanner {
    /// Planner aiming for between `min_count` and `max_count` ticks
    pub fn with_band(min_count: usize, max_count: usize) -> Self {
        let min_count = min_count.max(1);
        let max_count = max_count.max(min_count);
        Self {
            min_count,
            max_count,
            target: (min_count + max_count) / 2,
        }
    }

    /// Round values inside [min, max], strictly increasing.
    /// Equal bounds give the single value; reversed bounds are swapped.
    pub fn plan(&self, min: f64, max: f64) -> Vec<f64> {
        if !min.is_finite() || !max.is_finite() {
            return Vec::new();
        }
        if min == max {
            return vec![min];
        }
        let (min, max) = if min < max { (min, max) } else { (max, min) };

        let span = max - min;
        if !span.is_finite() {
            return Vec::new();
        }
        let top = span.log10().floor() as i32 + 1;
        let mut best: Option<(usize, Step)> = None;

        // Largest steps first so ties keep the coarser set
        for exp in (top - 2..=top).rev() {
            for &mult in MULTIPLIERS.iter().rev() {
                let step = Step { mult, exp };
                let n = step.count(min, max);
                if n == 0 {
                    continue;
                }
                let score = self.score(n);
                if best.map_or(true, |(s, _)| score < s) {
                    best = Some((score, step));
                }
            }
        }

        let ticks = best.map(|(_, step)| step.ticks(min, max)).unwrap_or_default();
        trace!(min, max, count = ticks.len(), "planned ticks");
        ticks
    }

    /// Lower is better: in-band counts rank by distance to target,
    /// out-of-band counts always rank below them.
    fn score(&self, n: usize) -> usize {
        let off_target = n.abs_diff(self.target);
        if (self.min_count..=self.max_count).contains(&n) {
            off_target
        } else if n < self.min_count {
            1000 + (self.min_count - n)
        } else {
            1000 + (n - self.max_count)
        }
    }
}
