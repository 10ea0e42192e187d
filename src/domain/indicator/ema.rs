//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first value (no SMA warmup):
//! EMA[0] = V[0], EMA[i] = V[i]*k + EMA[i-1]*(1-k).
//! Every output is defined; callers impose their own minimum history.

/// Recursive EMA over raw values. `period` must be non-zero.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = match values.first() {
        Some(&first) => first,
        None => return out,
    };
    for &v in values {
        ema = v * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seeded_with_first_value() {
        let out = ema_values(&[10.0, 20.0, 30.0], 3);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], 10.0);
    }

    #[test]
    fn ema_recursive_calculation() {
        let out = ema_values(&[10.0, 20.0, 30.0], 3);
        let k = 0.5;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        assert!((out[1] - e1).abs() < 1e-12);
        assert!((out[2] - e2).abs() < 1e-12);
    }

    #[test]
    fn ema_period_1_tracks_input() {
        assert_eq!(ema_values(&[10.0, 20.0, 30.0], 1), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_equal_prices() {
        let out = ema_values(&[100.0; 6], 3);
        assert!(out.iter().all(|v| (v - 100.0).abs() < 1e-12));
    }

    #[test]
    fn ema_empty() {
        assert!(ema_values(&[], 12).is_empty());
    }
}
