//! Gradient based optimization routines

pub mod simplex;

/// Running statistics of the partial derivatives computed by a gradient ascent
#[derive(Debug, Clone, Copy)]
pub struct DerivativeSummary {
    pub count: usize,
    pub total: f64,
    pub magnitude: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for DerivativeSummary {
    fn default() -> Self {
        DerivativeSummary {
            count: 0,
            total: 0.0,
            magnitude: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl DerivativeSummary {
    pub fn push(&mut self, derivative: f64) {
        self.count += 1;
        self.total += derivative;
        self.magnitude += derivative.abs();
        self.min = self.min.min(derivative);
        self.max = self.max.max(derivative);
    }

    pub fn average(&self) -> f64 {
        self.total / self.count.max(1) as f64
    }

    pub fn average_magnitude(&self) -> f64 {
        self.magnitude / self.count.max(1) as f64
    }
}

impl std::fmt::Display for DerivativeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computed partial derivative count: {}, Average partial derivative: {}, Average partial derivative magnitude: {}, Max partial derivative: {}, Min partial derivative: {}",
            self.count,
            self.average(),
            self.average_magnitude(),
            self.max,
            self.min
        )
    }
}
