//! Exponential moving average trend smoothing
//!
//! Span-based smoothing factor `alpha = 2 / (span + 1)`, seeded at the first
//! raw value so the series carries no warm-up bias toward zero. EMA state is
//! a pure function of the raw series: any upstream change to an earlier raw
//! value requires a full chronological recompute, never an incremental patch.

/// Stateless EMA computation over an ordered raw series
pub struct EmaSmoother;

impl EmaSmoother {
    /// Smooth a chronologically ordered series with the given span.
    ///
    /// An empty series yields an empty output.
    pub fn smooth(series: &[f64], span: usize) -> Vec<f64> {
        debug_assert!(span > 0, "EMA span must be positive");
        let alpha = 2.0 / (span as f64 + 1.0);

        let mut out = Vec::with_capacity(series.len());
        let mut ema = match series.first() {
            Some(&first) => first,
            None => return out,
        };
        out.push(ema);

        for &raw in &series[1..] {
            ema = alpha * raw + (1.0 - alpha) * ema;
            out.push(ema);
        }
        out
    }

    /// Smooth a series with fast and slow spans in one pass over the input.
    pub fn smooth_pair(series: &[f64], fast_span: usize, slow_span: usize) -> Vec<(f64, f64)> {
        let fast = Self::smooth(series, fast_span);
        let slow = Self::smooth(series, slow_span);
        fast.into_iter().zip(slow).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series() {
        assert!(EmaSmoother::smooth(&[], 7).is_empty());
        assert!(EmaSmoother::smooth_pair(&[], 7, 28).is_empty());
    }

    #[test]
    fn test_seeded_at_first_value() {
        let series = [0.6, 0.2, 0.9];
        let ema = EmaSmoother::smooth(&series, 7);
        assert_eq!(ema[0], 0.6);
    }

    #[test]
    fn test_constant_series_stays_constant() {
        let series = [0.35; 20];
        let ema = EmaSmoother::smooth(&series, 7);
        for value in ema {
            assert!((value - 0.35).abs() < 1e-12);
        }
    }

    #[test]
    fn test_recurrence() {
        let series = [0.0, 1.0];
        let ema = EmaSmoother::smooth(&series, 7);
        let alpha = 2.0 / 8.0;
        assert!((ema[1] - alpha).abs() < 1e-12);
    }

    #[test]
    fn test_slow_span_lags_fast_span() {
        // Step input: fast EMA must track the step more closely
        let mut series = vec![0.0; 10];
        series.extend(std::iter::repeat(1.0).take(10));
        let pair = EmaSmoother::smooth_pair(&series, 7, 28);
        let (fast, slow) = pair[series.len() - 1];
        assert!(fast > slow);
    }

    #[test]
    fn test_recompute_idempotence() {
        let series: Vec<f64> = (0..40).map(|i| (i as f64 * 0.37).sin().abs()).collect();
        let first = EmaSmoother::smooth(&series, 28);
        let second = EmaSmoother::smooth(&series, 28);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bounded_by_input_range() {
        let series: Vec<f64> = (0..100).map(|i| ((i * 7919) % 100) as f64 / 100.0).collect();
        for value in EmaSmoother::smooth(&series, 7) {
            assert!((0.0..=1.0).contains(&value));
        }
    }
}
