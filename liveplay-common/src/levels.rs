//! Decibel / linear gain conversion
//!
//! The UI shows -60 dB to +10 dB; -60 dB is treated as silence.

/// Silence floor for meters and conversions
pub const SILENCE_DB: f32 = -60.0;

/// Headroom above unity a volume may be boosted to
pub const MAX_GAIN_DB: f32 = 10.0;

/// Convert decibels to linear gain (`10^(dB/20)`), 0 at or below the floor
pub fn db_to_linear(db: f32) -> f32 {
    if db <= SILENCE_DB {
        return 0.0;
    }
    10f32.powf(db / 20.0)
}

/// Convert linear gain to decibels (`20 log10(x)`), floor for silence
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        return SILENCE_DB;
    }
    (20.0 * linear.log10()).max(SILENCE_DB)
}

/// Largest linear gain a transport is ever asked for
pub fn max_gain() -> f32 {
    db_to_linear(MAX_GAIN_DB)
}

/// Root mean square of `peaks[start..end]`, 0 for an empty range
pub fn rms(peaks: &[f32], start: usize, end: usize) -> f32 {
    let end = end.min(peaks.len());
    if start >= end {
        return 0.0;
    }
    let sum: f32 = peaks[start..end].iter().map(|p| p * p).sum();
    (sum / (end - start) as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unity_is_zero_db() {
        assert!(linear_to_db(1.0).abs() < 1e-5);
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_silence_floor() {
        assert_eq!(linear_to_db(0.0), SILENCE_DB);
        assert_eq!(linear_to_db(-1.0), SILENCE_DB);
        assert_eq!(linear_to_db(1e-9), SILENCE_DB);
        assert_eq!(db_to_linear(-60.0), 0.0);
        assert_eq!(db_to_linear(-90.0), 0.0);
    }

    #[test]
    fn test_six_db_doubles_amplitude() {
        assert!((db_to_linear(6.0206) - 2.0).abs() < 1e-3);
        assert!((max_gain() - 3.1623).abs() < 1e-3);
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[], 0, 0), 0.0);
        assert!((rms(&[0.5, 0.5, 0.5], 0, 3) - 0.5).abs() < 1e-6);
        assert!((rms(&[1.0, 0.0], 0, 10) - 0.70710677).abs() < 1e-5);
    }
}
