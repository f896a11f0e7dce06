/// Result of comparing a new likelihood with the previous one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub converged: bool,
    /// `L_i - L_{i-1}`
    pub difference: f64,
    /// `|difference / L_i|`
    pub rate: f64,
    /// Whether the step size was reduced
    pub shrunk: bool,
}

/// Tracks the joint likelihood across iterations, and the gradient step size that depends on it
///
/// The loop stops at the first iteration whose likelihood moved by less than `difference`. Whenever the
/// relative change falls below `rate`, the step size is multiplied by `shrinkage`.
#[derive(Debug, Clone)]
pub struct ConvergenceMonitor {
    previous: f64,
    step: f64,
    difference: f64,
    rate: f64,
    shrinkage: f64,
}

impl ConvergenceMonitor {
    /// The first likelihood is compared with the smallest positive subnormal double
    pub fn new(step: f64, difference: f64, rate: f64, shrinkage: f64) -> Self {
        ConvergenceMonitor {
            previous: f64::from_bits(1),
            step,
            difference,
            rate,
            shrinkage,
        }
    }

    pub fn observe(&mut self, likelihood: f64) -> Observation {
        let difference = likelihood - self.previous;
        self.previous = likelihood;
        let rate = (difference / likelihood).abs();

        let shrunk = rate < self.rate;
        if shrunk {
            self.step *= self.shrinkage;
        }

        Observation {
            converged: difference.abs() < self.difference,
            difference,
            rate,
            shrunk,
        }
    }

    /// The step size for the next gradient ascent
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn previous(&self) -> f64 {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stops_at_first_small_difference() {
        let mut monitor = ConvergenceMonitor::new(500.0, 1e-10, 1e-2, 0.9);
        let trace = [-3.0, -2.5, -2.4, -2.4 + 5e-10, -2.4 + 5e-10 + 5e-11, -2.4];
        let stopped = trace
            .iter()
            .position(|&l| monitor.observe(l).converged)
            .unwrap();
        assert_eq!(stopped, 4);
    }

    #[test]
    fn test_first_iteration_compares_to_smallest_positive() {
        let mut monitor = ConvergenceMonitor::new(500.0, 1e-10, 1e-2, 0.9);
        assert_eq!(monitor.previous().to_bits(), 1);
        assert!(monitor.previous() > 0.0 && !monitor.previous().is_normal());
        let observation = monitor.observe(-1.0);
        assert!(!observation.converged);
        assert_eq!(observation.difference, -1.0);
        assert_eq!(monitor.previous(), -1.0);
    }

    #[test]
    fn test_step_shrinks_on_slow_progress() {
        let mut monitor = ConvergenceMonitor::new(500.0, 1e-10, 1e-2, 0.9);
        monitor.observe(-2.0);
        assert_eq!(monitor.step(), 500.0);
        let observation = monitor.observe(-1.999);
        assert!(observation.shrunk);
        assert!((monitor.step() - 450.0).abs() < 1e-9);
    }
}
