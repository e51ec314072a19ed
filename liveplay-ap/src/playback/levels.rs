//! Level estimation for meters
//!
//! Levels are estimates, not measurements: the engine never sees samples.
//! A cue's level combines its volume with the cached waveform peak at the
//! current play position.

use liveplay_common::levels::{db_to_linear, linear_to_db, SILENCE_DB};

use super::types::MasterLevel;

/// Peak magnitude assumed when a cue has no cached waveform
pub const DEFAULT_PEAK: f32 = 0.7;

/// Peak-hold fall per meter update
pub const PEAK_DECAY_DB: f32 = 0.3;

/// Estimated level of one cue in dB, within -60..=0
///
/// `current_time` is relative to the trim window, `in_point` shifts it back
/// to file time and `item_duration` is the whole-file length the peaks span.
pub fn estimate_level(
    volume: f32,
    peaks: Option<&[f32]>,
    current_time: f64,
    item_duration: f64,
    in_point: f64,
) -> f32 {
    let volume_db = linear_to_db(volume);
    if volume_db <= SILENCE_DB {
        return SILENCE_DB;
    }

    let peak = match peaks {
        Some(peaks) if !peaks.is_empty() && item_duration > 0.0 => {
            smoothed_peak(peaks, (current_time + in_point) / item_duration)
        }
        _ => DEFAULT_PEAK,
    };

    (volume_db + linear_to_db(peak)).clamp(SILENCE_DB, 0.0)
}

/// Peak nearest `fraction` of the file, averaged with its neighbours
fn smoothed_peak(peaks: &[f32], fraction: f64) -> f32 {
    let last = peaks.len() - 1;
    let index = (fraction * peaks.len() as f64).round();
    let index = if index.is_finite() && index > 0.0 {
        (index as usize).min(last)
    } else {
        0
    };

    let start = index.saturating_sub(1);
    let end = (index + 1).min(last);
    let window = &peaks[start..=end];
    window.iter().sum::<f32>() / window.len() as f32
}

/// Hold the higher of the new level and the decayed previous peak
pub fn hold_peak(previous_peak: f32, level: f32) -> f32 {
    level.max(previous_peak - PEAK_DECAY_DB).max(SILENCE_DB)
}

/// Combine cue levels into one output meter reading
///
/// Linear amplitudes are summed and converted back to dB. With no cue
/// active the meter and its peak drop straight to silence.
pub fn update_master_level<I>(previous: MasterLevel, cue_levels: I) -> MasterLevel
where
    I: IntoIterator<Item = f32>,
{
    let mut any = false;
    let mut sum = 0.0f32;
    for level in cue_levels {
        any = true;
        sum += db_to_linear(level);
    }

    if !any {
        return MasterLevel::default();
    }

    let level = linear_to_db(sum).clamp(SILENCE_DB, 0.0);
    MasterLevel {
        level,
        peak: hold_peak(previous.peak, level),
    }
}
