// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Battery voltage shared between the battery tick (writer) and the background loop (reader).

use core::sync::atomic::{AtomicU16, Ordering};

use crate::config::{
    ADC_FULL_SCALE, ADC_REFERENCE_MV, BATTERY_DIVIDER_DEN, BATTERY_DIVIDER_NUM,
    BATTERY_HYSTERESIS_MV, BATTERY_LOW_MV,
};

/// Convert a raw 12-bit ADC sample at the divider tap into pack millivolts.
pub fn raw_to_millivolts(raw: u16) -> u16 {
    let tap_mv = raw.min(ADC_FULL_SCALE as u16) as u32 * ADC_REFERENCE_MV / ADC_FULL_SCALE;
    let pack_mv = tap_mv * BATTERY_DIVIDER_NUM / BATTERY_DIVIDER_DEN;
    pack_mv.min(u16::MAX as u32) as u16
}

/// Latest battery sample in millivolts. `0` until the first sample lands.
pub struct BatteryLevel {
    mv: AtomicU16,
}

impl BatteryLevel {
    pub const fn new() -> Self {
        Self {
            mv: AtomicU16::new(0),
        }
    }

    /// Record a raw ADC sample. Called from the battery tick only.
    #[inline]
    pub fn record_raw(&self, raw: u16) {
        self.mv.store(raw_to_millivolts(raw), Ordering::Relaxed);
    }

    #[inline]
    pub fn millivolts(&self) -> u16 {
        self.mv.load(Ordering::Relaxed)
    }
}

impl Default for BatteryLevel {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one threshold check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BatteryEvent {
    /// Crossed below the limit on this check.
    WentLow,
    /// Climbed back above limit + hysteresis.
    Recovered,
}

/// Latched low-battery detector with recovery hysteresis.
#[derive(Copy, Clone, Debug, Default)]
pub struct BatteryGuard {
    low: bool,
}

impl BatteryGuard {
    pub const fn new() -> Self {
        Self { low: false }
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self.low
    }

    /// Feed the latest reading. A reading of `0` means "not sampled yet" and is ignored.
    pub fn check(&mut self, mv: u16) -> Option<BatteryEvent> {
        if mv == 0 {
            return None;
        }
        if !self.low && mv < BATTERY_LOW_MV {
            self.low = true;
            return Some(BatteryEvent::WentLow);
        }
        if self.low && mv >= BATTERY_LOW_MV + BATTERY_HYSTERESIS_MV {
            self.low = false;
            return Some(BatteryEvent::Recovered);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_undoes_divider() {
        assert_eq!(raw_to_millivolts(0), 0);
        // full scale tap = 3300 mV, pack = 3300 * 11 / 3
        assert_eq!(raw_to_millivolts(4095), 12_100);
        assert_eq!(raw_to_millivolts(u16::MAX), 12_100);
    }

    #[test]
    fn level_stores_converted_sample() {
        let level = BatteryLevel::new();
        assert_eq!(level.millivolts(), 0);
        level.record_raw(2048);
        assert_eq!(level.millivolts(), raw_to_millivolts(2048));
    }

    #[test]
    fn guard_latches_and_recovers_with_hysteresis() {
        let mut guard = BatteryGuard::new();
        assert_eq!(guard.check(0), None);
        assert_eq!(guard.check(7400), None);
        assert_eq!(guard.check(6700), Some(BatteryEvent::WentLow));
        assert_eq!(guard.check(6500), None);
        assert_eq!(guard.check(6900), None);
        assert!(guard.is_low());
        assert_eq!(guard.check(7000), Some(BatteryEvent::Recovered));
        assert!(!guard.is_low());
    }
}
