//! Tolerances for direction and parallelism tests.

/// Default tolerance, in degrees, for [`PointContext::is_parallel`](crate::PointContext::is_parallel).
pub const DEFAULT_PARALLEL_TOLERANCE: f64 = 2.0;

/// Tolerances threaded through the point-context predicates and the analyzer.
///
/// Interpolated outlines rarely land on the integer grid, so callers that work
/// with derived masters usually want a non-zero `vertical`/`horizontal` slack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceConfig {
    /// Maximum |dx| for two points to count as vertically aligned.
    pub vertical: f64,
    /// Maximum |dy| for two points to count as horizontally aligned.
    pub horizontal: f64,
    /// Maximum angle difference, in degrees, for two contexts to count as parallel.
    pub parallel: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self { vertical: 0.0, horizontal: 0.0, parallel: DEFAULT_PARALLEL_TOLERANCE }
    }
}

impl ToleranceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the same slack for vertical and horizontal alignment.
    pub fn uniform(tolerance: f64) -> Self {
        Self { vertical: tolerance, horizontal: tolerance, ..Self::default() }
    }

    pub fn vertical(mut self, tolerance: f64) -> Self {
        self.vertical = tolerance;
        self
    }

    pub fn horizontal(mut self, tolerance: f64) -> Self {
        self.horizontal = tolerance;
        self
    }

    pub fn parallel(mut self, degrees: f64) -> Self {
        self.parallel = degrees;
        self
    }
}
