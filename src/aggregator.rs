//! Aggregator callbacks invoked with each non-empty window snapshot
//!
//! The engine treats the aggregator as an injected capability: it hands over
//! a copy of the in-window values and only cares whether the call succeeded.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum AggregatorError {
    EmptyInput,
    NonFinite(f32),
    Failed(String),
}

impl std::fmt::Display for AggregatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregatorError::EmptyInput => write!(f, "Cannot aggregate an empty window"),
            AggregatorError::NonFinite(v) => write!(f, "Aggregate is not finite: {}", v),
            AggregatorError::Failed(msg) => write!(f, "Aggregator failed: {}", msg),
        }
    }
}

impl std::error::Error for AggregatorError {}

/// Callback run by the evaluator for every non-empty snapshot
///
/// Values arrive oldest first. Errors are logged by the engine and never
/// stop it.
pub trait Aggregator: Send + Sync + 'static {
    fn aggregate(&self, values: &[f32]) -> Result<(), AggregatorError>;
}

impl<F> Aggregator for F
where
    F: Fn(&[f32]) -> Result<(), AggregatorError> + Send + Sync + 'static,
{
    fn aggregate(&self, values: &[f32]) -> Result<(), AggregatorError> {
        self(values)
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let total: f32 = values.iter().sum();
    Some(total / values.len() as f32)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageReport {
    pub average: f32,
    pub count: usize,
    pub threshold_reached: bool,
}

/// Averages the window and reports when the mean reaches a threshold
#[derive(Debug, Clone)]
pub struct ThresholdAverage {
    threshold: f32,
    window_duration: Duration,
}

impl ThresholdAverage {
    pub fn new(threshold: f32, window_duration: Duration) -> Self {
        Self {
            threshold,
            window_duration,
        }
    }

    pub fn evaluate(&self, values: &[f32]) -> Result<AverageReport, AggregatorError> {
        let average = mean(values).ok_or(AggregatorError::EmptyInput)?;
        if !average.is_finite() {
            return Err(AggregatorError::NonFinite(average));
        }

        Ok(AverageReport {
            average,
            count: values.len(),
            threshold_reached: average >= self.threshold,
        })
    }
}

impl Aggregator for ThresholdAverage {
    fn aggregate(&self, values: &[f32]) -> Result<(), AggregatorError> {
        let report = self.evaluate(values)?;
        let window_ms = self.window_duration.as_millis();

        log::info!(
            "🧩 average value in last {} ms: {:.3} ({} samples)",
            window_ms,
            report.average,
            report.count
        );

        if report.threshold_reached {
            log::warn!(
                "❗ average value in last {} ms: {:.3} reaches the threshold {}!",
                window_ms,
                report.average,
                self.threshold
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_seconds() -> ThresholdAverage {
        ThresholdAverage::new(13.0, Duration::from_secs(10))
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[20.0, 20.0, 20.0]), Some(20.0));
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn test_threshold_reached_is_inclusive() {
        let agg = ten_seconds();

        let at = agg.evaluate(&[13.0, 13.0]).unwrap();
        assert!(at.threshold_reached);

        let below = agg.evaluate(&[12.0, 13.0]).unwrap();
        assert_eq!(below.average, 12.5);
        assert!(!below.threshold_reached);

        let above = agg.evaluate(&[20.0, 20.0, 20.0]).unwrap();
        assert_eq!(above.count, 3);
        assert!(above.threshold_reached);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert_eq!(ten_seconds().evaluate(&[]), Err(AggregatorError::EmptyInput));
        assert_eq!(ten_seconds().aggregate(&[]), Err(AggregatorError::EmptyInput));
    }

    #[test]
    fn test_non_finite_average() {
        let result = ten_seconds().evaluate(&[f32::MAX, f32::MAX]);
        assert!(matches!(result, Err(AggregatorError::NonFinite(_))));
    }

    #[test]
    fn test_closure_aggregator() {
        let failing = |values: &[f32]| -> Result<(), AggregatorError> {
            Err(AggregatorError::Failed(format!("{} values", values.len())))
        };

        let err = failing.aggregate(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err.to_string(), "Aggregator failed: 2 values");
    }
}
