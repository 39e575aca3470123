//! Input checks for the hardware helpers.
//!
//! None of these reject input. Each returns a [`Checked`] value holding what should
//! actually be written and, when the request had to be replaced by a default, the
//! reason. The helpers log the reason as a warning and carry on.

use std::ops::RangeInclusive;

/// Levels an attenuator accepts.
pub const ATTENUATION_STEPS: [i64; 7] = [0, 1, 2, 4, 8, 16, 31];

/// Attenuator instances per bank.
pub const ATTENUATOR_INSTANCES: RangeInclusive<i64> = 1..=4;

/// Waveform selector instances.
pub const WAVEFORM_INSTANCES: RangeInclusive<i64> = 0..=3;

/// Largest value the DAQ mux buffer-size register holds (0xFFFF_FFFF).
pub const MAX_BUFFER_SIZE: u32 = u32::MAX;

/// Buffer size used when none is requested.
pub const DEFAULT_BUFFER_SIZE: u64 = 1 << 19;

/// Result of checking one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checked<T> {
    /// Value to use.
    pub value: T,
    /// Why the request was replaced, if it was.
    pub reason: Option<&'static str>,
}

impl<T> Checked<T> {
    fn valid(value: T) -> Self {
        Self {
            value,
            reason: None,
        }
    }

    fn defaulted(value: T, reason: &'static str) -> Self {
        Self {
            value,
            reason: Some(reason),
        }
    }

    /// Whether a default was substituted.
    pub fn was_corrected(&self) -> bool {
        self.reason.is_some()
    }
}

/// Whether `value` lies in `range`.
pub fn is_in_range<T: PartialOrd>(value: T, range: &RangeInclusive<T>) -> bool {
    range.contains(&value)
}

/// Attenuation level; anything outside [`ATTENUATION_STEPS`] becomes 0.
pub fn attenuation_level(level: i64) -> Checked<i64> {
    if ATTENUATION_STEPS.contains(&level) {
        Checked::valid(level)
    } else {
        Checked::defaulted(0, "attenuator value invalid, using default 0")
    }
}

/// Attenuator instance; unset or outside 1..=4 becomes 1.
pub fn attenuator_instance(instance: Option<i64>) -> Checked<i64> {
    match instance {
        None => Checked::defaulted(1, "attenuator instance not specified, using default 1"),
        Some(i) if is_in_range(i, &ATTENUATOR_INSTANCES) => Checked::valid(i),
        Some(_) => Checked::defaulted(1, "attenuator instance out of range, using default 1"),
    }
}

/// Waveform selector; anything but 0 or 1 becomes 0.
pub fn waveform_select(select: i64) -> Checked<i64> {
    match select {
        0 | 1 => Checked::valid(select),
        _ => Checked::defaulted(0, "waveform value invalid, using default 0"),
    }
}

/// Waveform instance; unset or outside 0..=3 becomes 0.
pub fn waveform_instance(instance: Option<i64>) -> Checked<i64> {
    match instance {
        None => Checked::defaulted(0, "waveform instance not specified, using default 0"),
        Some(i) if is_in_range(i, &WAVEFORM_INSTANCES) => Checked::valid(i),
        Some(_) => Checked::defaulted(0, "waveform instance out of range, using default 0"),
    }
}

/// Buffer size, clamped to [`MAX_BUFFER_SIZE`].
pub fn buffer_size(size: u64) -> Checked<u32> {
    match u32::try_from(size) {
        Ok(size) => Checked::valid(size),
        Err(_) => Checked::defaulted(MAX_BUFFER_SIZE, "buffer size too large, using maximum"),
    }
}

/// Bay selector; anything but 0 or 1 becomes 0.
pub fn bay(bay: i64) -> Checked<u8> {
    match bay {
        0 => Checked::valid(0),
        1 => Checked::valid(1),
        _ => Checked::defaulted(0, "bay value unrecognized, using default 0"),
    }
}
