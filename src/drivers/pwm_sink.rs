// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! PWM sink contract: 32 logical channels spread over two chained 16-channel expanders.
//!
//! Duty cycle is defined by the "off" edge only; the "on" edge is always 0.

use crate::config::{CHANNEL_COUNT, CHIP_CHANNELS, PWM_OFF_MAX};
use crate::error::SinkError;

/// Which expander a logical channel lives on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Chip {
    /// Channels 0..16.
    A,
    /// Channels 16..32.
    B,
}

impl Chip {
    /// Split a logical channel (0..32) into its chip and local channel index.
    #[inline]
    pub fn locate(channel: usize) -> (Chip, u8) {
        if channel < CHIP_CHANNELS {
            (Chip::A, channel as u8)
        } else {
            (Chip::B, (channel - CHIP_CHANNELS) as u8)
        }
    }
}

/// Anything that can drive one logical PWM channel.
pub trait PwmSink {
    /// Write one channel. `channel` is the logical index (0..32).
    fn write_channel(&mut self, channel: usize, on: u16, off: u16) -> Result<(), SinkError>;

    /// Write a full output sample. Stops at the first failing channel.
    fn write_all(&mut self, outputs: &[i16; CHANNEL_COUNT]) -> Result<(), SinkError> {
        for (channel, &value) in outputs.iter().enumerate() {
            self.write_channel(channel, 0, off_time(value))?;
        }
        Ok(())
    }
}

/// Convert a servo output value into the 12-bit "off" edge.
#[inline]
pub fn off_time(value: i16) -> u16 {
    (value.max(0) as u16).min(PWM_OFF_MAX)
}
